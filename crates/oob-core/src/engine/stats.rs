//! Engine statistics
//!
//! Counters are updated lock-free from every pipeline thread; [`Stats`] is a
//! point-in-time copy.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for engine execution
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Frames returned by the device
    pub frames_read: u64,
    /// Frames taken off the ingress queue and fully handled
    pub frames_processed: u64,
    /// Frames without an IPv4/IPv6 layer
    pub frames_discarded: u64,
    /// Frames run through the TCP handler chain
    pub tcp_dispatched: u64,
    /// Frames run through the UDP handler chain
    pub udp_dispatched: u64,
    /// Frames run through the generic IP handler chain
    pub ip_dispatched: u64,
    /// TCP frames a handler asked to reset
    pub resets_requested: u64,
    /// Reset frames built and queued for injection
    pub resets_synthesized: u64,
    /// Reset requests that produced no frame
    pub synthesis_failed: u64,
    /// Frames written to the device
    pub frames_injected: u64,
    /// Device writes that failed
    pub write_failed: u64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read={} processed={} discarded={} ",
            self.frames_read, self.frames_processed, self.frames_discarded
        )?;
        write!(
            f,
            "tcp={} udp={} ip={} ",
            self.tcp_dispatched, self.udp_dispatched, self.ip_dispatched
        )?;
        write!(
            f,
            "resets={}/{} synth_failed={} injected={} write_failed={}",
            self.resets_synthesized,
            self.resets_requested,
            self.synthesis_failed,
            self.frames_injected,
            self.write_failed
        )
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub frames_read: AtomicU64,
    pub frames_processed: AtomicU64,
    pub frames_discarded: AtomicU64,
    pub tcp_dispatched: AtomicU64,
    pub udp_dispatched: AtomicU64,
    pub ip_dispatched: AtomicU64,
    pub resets_requested: AtomicU64,
    pub resets_synthesized: AtomicU64,
    pub synthesis_failed: AtomicU64,
    pub frames_injected: AtomicU64,
    pub write_failed: AtomicU64,
}

pub(crate) fn bump(counter: &AtomicU64) {
    counter.fetch_add(1, Ordering::Relaxed);
}

impl Counters {
    pub fn snapshot(&self) -> Stats {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        Stats {
            frames_read: get(&self.frames_read),
            frames_processed: get(&self.frames_processed),
            frames_discarded: get(&self.frames_discarded),
            tcp_dispatched: get(&self.tcp_dispatched),
            udp_dispatched: get(&self.udp_dispatched),
            ip_dispatched: get(&self.ip_dispatched),
            resets_requested: get(&self.resets_requested),
            resets_synthesized: get(&self.resets_synthesized),
            synthesis_failed: get(&self.synthesis_failed),
            frames_injected: get(&self.frames_injected),
            write_failed: get(&self.write_failed),
        }
    }
}
