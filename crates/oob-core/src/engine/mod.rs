//! Traffic engine
//!
//! One reader (the caller of [`TrafficEngine::run`]) feeds a bounded ingress
//! queue. A fixed pool of workers decodes, classifies and dispatches frames,
//! pushing synthesized resets onto a bounded egress queue that a single
//! writer drains back into the device.
//!
//! ```text
//! Device::read -> ingress -> worker xN -> egress -> writer -> Device::write
//! ```

mod stats;
mod worker;

/// Pause after a `WouldBlock` read so a non-blocking device does not spin
const IDLE_BACKOFF: Duration = Duration::from_millis(1);

pub use stats::Stats;

use crate::config::{Config, EngineConfig};
use crate::device::{is_idle, Device};
use crate::error::{Error, Result};
use crate::handler::Handlers;
use crate::synth::{RstSynthesizer, SynthConfig};
use bytes::Bytes;
use crossbeam_channel::{bounded, Sender};
use stats::{bump, Counters};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use worker::{run_writer, Worker};

/// Cloneable handle used to stop a running engine from another thread
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask the engine to stop reading; frames already queued are still processed
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Release);
    }

    /// Check if a stop was requested
    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Out-of-band reset engine
///
/// Handlers are frozen at construction. A stopped engine stays stopped: once
/// [`ShutdownHandle::shutdown`] has been called, later runs return immediately.
pub struct TrafficEngine {
    handlers: Handlers,
    config: EngineConfig,
    synth: RstSynthesizer,
    shutdown: ShutdownHandle,
    counters: Arc<Counters>,
}

impl TrafficEngine {
    /// Create an engine with default sizing and synthesis options
    pub fn new(handlers: Handlers) -> Self {
        Self::with_config(handlers, EngineConfig::default(), SynthConfig::default())
    }

    /// Create an engine with explicit options
    pub fn with_config(handlers: Handlers, config: EngineConfig, synth: SynthConfig) -> Self {
        Self {
            handlers,
            config,
            synth: RstSynthesizer::new(synth),
            shutdown: ShutdownHandle::default(),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Create an engine from a loaded [`Config`]
    pub fn from_config(handlers: Handlers, config: &Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_config(handlers, config.engine.clone(), config.synth))
    }

    /// Handle for stopping [`run`](Self::run) from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Current counter values
    pub fn stats(&self) -> Stats {
        self.counters.snapshot()
    }

    /// Registered handlers
    pub fn handlers(&self) -> &Handlers {
        &self.handlers
    }

    /// Run the pipeline on `device` until a read fails or a stop is requested
    ///
    /// Blocks the calling thread, which becomes the reader. Every worker and
    /// the writer have exited by the time this returns, and every frame that
    /// was read has been processed.
    ///
    /// # Errors
    ///
    /// [`Error::Capture`] with the device's error when a read fails for a
    /// reason other than an idle tick, [`Error::Spawn`] when a pipeline thread
    /// cannot be started.
    #[instrument(skip_all, name = "engine")]
    pub fn run<D: Device + 'static>(&self, device: D) -> Result<()> {
        let device = Arc::new(device);
        let workers = self.config.worker_count();
        let poll = self.config.poll_interval();

        let (ingress_tx, ingress_rx) = bounded::<Bytes>(self.config.ingress_capacity);
        let (egress_tx, egress_rx) = bounded::<Bytes>(self.config.egress_capacity);
        let input_closed = Arc::new(AtomicBool::new(false));

        info!(
            workers,
            ingress = self.config.ingress_capacity,
            egress = self.config.egress_capacity,
            tcp_handlers = self.handlers.tcp_len(),
            udp_handlers = self.handlers.udp_len(),
            ip_handlers = self.handlers.ip_len(),
            "Starting traffic engine"
        );

        let mut worker_handles = Vec::with_capacity(workers);
        let mut spawned = Ok(());
        for id in 0..workers {
            let worker = Worker::new(
                id,
                ingress_rx.clone(),
                egress_tx.clone(),
                self.handlers.clone(),
                self.synth.clone(),
                self.counters.clone(),
                input_closed.clone(),
                poll,
            );
            match thread::Builder::new()
                .name(format!("oob-worker-{id}"))
                .spawn(move || worker.run())
            {
                Ok(handle) => worker_handles.push(handle),
                Err(source) => {
                    spawned = Err(Error::Spawn { role: "worker", source });
                    break;
                }
            }
        }
        // Only the threads hold queue ends from here on, so closing the
        // producer side propagates through the pipeline.
        drop(ingress_rx);
        drop(egress_tx);

        let writer_handle = if spawned.is_ok() {
            let device = device.clone();
            let counters = self.counters.clone();
            match thread::Builder::new()
                .name("oob-writer".to_string())
                .spawn(move || run_writer(&*device, egress_rx, &counters))
            {
                Ok(handle) => Some(handle),
                Err(source) => {
                    spawned = Err(Error::Spawn { role: "writer", source });
                    None
                }
            }
        } else {
            None
        };

        let result = spawned.and_then(|()| self.read_loop(&*device, &ingress_tx));

        input_closed.store(true, Ordering::Release);
        drop(ingress_tx);
        join_all("worker", worker_handles);
        if let Some(handle) = writer_handle {
            join_all("writer", [handle]);
        }

        match &result {
            Ok(()) => info!(stats = %self.stats(), "Traffic engine stopped"),
            Err(e) => warn!(error = %e, stats = %self.stats(), "Traffic engine stopped"),
        }
        result
    }

    fn read_loop<D: Device + ?Sized>(&self, device: &D, ingress: &Sender<Bytes>) -> Result<()> {
        loop {
            if self.shutdown.is_shutdown() {
                debug!("Shutdown requested");
                return Ok(());
            }

            match device.read() {
                Ok(frame) => {
                    bump(&self.counters.frames_read);
                    if ingress.send(frame).is_err() {
                        // Every worker is gone, which only happens if they panicked.
                        return Err(Error::WorkersStopped);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => thread::sleep(IDLE_BACKOFF),
                Err(e) if is_idle(&e) => continue,
                Err(e) => return Err(Error::Capture(e)),
            }
        }
    }
}

fn join_all(role: &str, handles: impl IntoIterator<Item = JoinHandle<()>>) {
    for handle in handles {
        if handle.join().is_err() {
            warn!(role, "Pipeline thread panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::FrameBuilder;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::io;
    use std::net::IpAddr;

    /// Replays a fixed list of frames, then fails
    struct Replay {
        frames: Mutex<VecDeque<Bytes>>,
        written: Mutex<Vec<Vec<u8>>>,
    }

    impl Replay {
        fn new(frames: Vec<Vec<u8>>) -> Self {
            Self {
                frames: Mutex::new(frames.into_iter().map(Bytes::from).collect()),
                written: Mutex::new(Vec::new()),
            }
        }
    }

    impl Device for Replay {
        fn read(&self) -> io::Result<Bytes> {
            self.frames
                .lock()
                .pop_front()
                .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "replay exhausted"))
        }

        fn write(&self, frame: &[u8]) -> io::Result<()> {
            self.written.lock().push(frame.to_vec());
            Ok(())
        }
    }

    fn small_config() -> EngineConfig {
        EngineConfig {
            workers: 2,
            ingress_capacity: 4,
            egress_capacity: 4,
            poll_interval_ms: 5,
        }
    }

    #[test]
    fn test_read_failure_is_returned() {
        let engine = TrafficEngine::with_config(
            Handlers::default(),
            small_config(),
            SynthConfig::default(),
        );
        let err = engine.run(Replay::new(Vec::new())).unwrap_err();
        assert!(matches!(err, Error::Capture(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_reset_written_to_device() {
        let handlers = Handlers::builder()
            .tcp(|_: IpAddr, _: IpAddr, payload: &[u8]| payload == b"kill")
            .build();
        let engine = TrafficEngine::with_config(handlers, small_config(), SynthConfig::default());

        let device = Arc::new(Replay::new(vec![
            FrameBuilder::tcp_v4().payload(b"keep").build(),
            FrameBuilder::tcp_v4().payload(b"kill").build(),
        ]));
        assert!(engine.run(device.clone()).is_err());

        assert_eq!(device.written.lock().len(), 1);
        let stats = engine.stats();
        assert_eq!(stats.frames_read, 2);
        assert_eq!(stats.frames_processed, 2);
        assert_eq!(stats.resets_requested, 1);
        assert_eq!(stats.frames_injected, 1);
    }

    #[test]
    fn test_stop_before_run() {
        let engine = TrafficEngine::with_config(
            Handlers::default(),
            small_config(),
            SynthConfig::default(),
        );
        engine.shutdown_handle().shutdown();

        let device = Arc::new(Replay::new(vec![FrameBuilder::tcp_v4().build()]));
        assert!(engine.run(device.clone()).is_ok());
        assert_eq!(engine.stats().frames_read, 0);
        assert_eq!(device.frames.lock().len(), 1);
    }

    #[test]
    fn test_from_config_validates() {
        let mut config = Config::default();
        config.engine.egress_capacity = 0;
        assert!(TrafficEngine::from_config(Handlers::default(), &config).is_err());
    }
}
