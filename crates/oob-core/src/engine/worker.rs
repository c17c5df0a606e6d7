//! Worker and egress writer loops

use super::stats::{bump, Counters};
use crate::device::Device;
use crate::handler::Handlers;
use crate::packet::LayerDecoder;
use crate::synth::RstSynthesizer;
use bytes::Bytes;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// One decode/classify/dispatch unit
pub(crate) struct Worker {
    pub id: usize,
    pub ingress: Receiver<Bytes>,
    pub egress: Sender<Bytes>,
    pub handlers: Handlers,
    pub synth: RstSynthesizer,
    pub counters: Arc<Counters>,
    /// Raised once the reader has stopped producing
    pub drained: Arc<AtomicBool>,
    pub poll: Duration,
    decoder: LayerDecoder,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        ingress: Receiver<Bytes>,
        egress: Sender<Bytes>,
        handlers: Handlers,
        synth: RstSynthesizer,
        counters: Arc<Counters>,
        drained: Arc<AtomicBool>,
        poll: Duration,
    ) -> Self {
        Self {
            id,
            ingress,
            egress,
            handlers,
            synth,
            counters,
            drained,
            poll,
            decoder: LayerDecoder::new(),
        }
    }

    pub fn run(mut self) {
        debug!(worker = self.id, "Worker started");

        loop {
            match self.ingress.recv_timeout(self.poll) {
                Ok(frame) => self.process(&frame),
                Err(RecvTimeoutError::Timeout) => {
                    if self.drained.load(Ordering::Acquire) {
                        // The reader is done; pick up anything that raced the flag.
                        while let Ok(frame) = self.ingress.try_recv() {
                            self.process(&frame);
                        }
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        debug!(worker = self.id, "Worker stopped");
    }

    fn process(&mut self, frame: &[u8]) {
        let view = self.decoder.decode(frame);

        let Some((src, dst)) = view.addresses() else {
            trace!(worker = self.id, ethertype = view.ethertype, "Discarding non-IP frame");
            bump(&self.counters.frames_discarded);
            bump(&self.counters.frames_processed);
            return;
        };
        let payload = view.payload(frame);

        if view.is_tcp() {
            bump(&self.counters.tcp_dispatched);
            if let Some(index) = self.handlers.evaluate_tcp(src, dst, payload) {
                bump(&self.counters.resets_requested);
                trace!(
                    worker = self.id,
                    handler = self.handlers.tcp_name(index).unwrap_or("?"),
                    %src,
                    %dst,
                    "Reset requested"
                );

                match self.synth.synthesize(view) {
                    Ok(rst) => {
                        bump(&self.counters.resets_synthesized);
                        if self.egress.send(rst).is_err() {
                            debug!(worker = self.id, "Egress queue closed, reset dropped");
                        }
                    }
                    Err(e) => {
                        bump(&self.counters.synthesis_failed);
                        debug!(worker = self.id, error = %e, "Reset not synthesized");
                    }
                }
            }
        } else if view.is_udp() {
            bump(&self.counters.udp_dispatched);
            self.handlers.observe_udp(src, dst, payload);
        } else {
            bump(&self.counters.ip_dispatched);
            self.handlers.observe_ip(src, dst, payload);
        }

        bump(&self.counters.frames_processed);
    }
}

/// Drain the egress queue into the device
///
/// Runs until every worker has dropped its sender and the queue is empty.
pub(crate) fn run_writer<D: Device + ?Sized>(device: &D, egress: Receiver<Bytes>, counters: &Counters) {
    debug!("Writer started");

    for frame in egress.iter() {
        match device.write(&frame) {
            Ok(()) => bump(&counters.frames_injected),
            Err(e) => {
                bump(&counters.write_failed);
                trace!(error = %e, len = frame.len(), "Injection failed");
            }
        }
    }

    debug!("Writer stopped");
}
