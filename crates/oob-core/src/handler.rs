//! Inspection handlers
//!
//! Handlers are the policy seam of the engine. They are registered once,
//! shared read-only between workers and invoked concurrently, so any state
//! they keep must be synchronized by the handler itself.
//!
//! Plain closures work as handlers:
//!
//! ```rust
//! use oob_core::handler::{Handlers, Verdict};
//! use std::net::IpAddr;
//!
//! let handlers = Handlers::builder()
//!     .tcp(|_src: IpAddr, _dst: IpAddr, payload: &[u8]| {
//!         Verdict::reset_if(payload.windows(6).any(|w| w == b"Host: "))
//!     })
//!     .udp(|_src: IpAddr, _dst: IpAddr, _payload: &[u8]| {})
//!     .build();
//! assert_eq!(handlers.tcp_len(), 1);
//! ```

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

/// Decision of a TCP handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    /// Leave the flow alone
    #[default]
    Pass,
    /// Inject a reset into the flow
    Reset,
}

impl Verdict {
    /// `Reset` when `cond` holds
    pub fn reset_if(cond: bool) -> Self {
        if cond {
            Verdict::Reset
        } else {
            Verdict::Pass
        }
    }

    /// Check if this verdict asks for a reset
    pub fn is_reset(self) -> bool {
        matches!(self, Verdict::Reset)
    }
}

impl From<bool> for Verdict {
    fn from(reset: bool) -> Self {
        Verdict::reset_if(reset)
    }
}

/// Handler for TCP segments
pub trait TcpHandler: Send + Sync {
    /// Inspect a segment payload and decide whether to reset the flow
    fn evaluate(&self, src: IpAddr, dst: IpAddr, payload: &[u8]) -> Verdict;

    /// Name for logging
    fn name(&self) -> &str {
        "tcp"
    }
}

/// Observer for UDP datagrams
pub trait UdpHandler: Send + Sync {
    /// Observe a datagram payload
    fn observe(&self, src: IpAddr, dst: IpAddr, payload: &[u8]);

    /// Name for logging
    fn name(&self) -> &str {
        "udp"
    }
}

/// Observer for IP traffic that is neither TCP nor UDP
pub trait IpHandler: Send + Sync {
    /// Observe the IP payload
    fn observe(&self, src: IpAddr, dst: IpAddr, payload: &[u8]);

    /// Name for logging
    fn name(&self) -> &str {
        "ip"
    }
}

impl<F, V> TcpHandler for F
where
    F: Fn(IpAddr, IpAddr, &[u8]) -> V + Send + Sync,
    V: Into<Verdict>,
{
    fn evaluate(&self, src: IpAddr, dst: IpAddr, payload: &[u8]) -> Verdict {
        self(src, dst, payload).into()
    }
}

impl<F> UdpHandler for F
where
    F: Fn(IpAddr, IpAddr, &[u8]) + Send + Sync,
{
    fn observe(&self, src: IpAddr, dst: IpAddr, payload: &[u8]) {
        self(src, dst, payload);
    }
}

impl<F> IpHandler for F
where
    F: Fn(IpAddr, IpAddr, &[u8]) + Send + Sync,
{
    fn observe(&self, src: IpAddr, dst: IpAddr, payload: &[u8]) {
        self(src, dst, payload);
    }
}

/// Ordered, immutable handler registries
#[derive(Clone)]
pub struct Handlers {
    tcp: Arc<[Arc<dyn TcpHandler>]>,
    udp: Arc<[Arc<dyn UdpHandler>]>,
    ip: Arc<[Arc<dyn IpHandler>]>,
}

impl Handlers {
    /// Start building a registry
    pub fn builder() -> HandlersBuilder {
        HandlersBuilder::default()
    }

    /// Run the TCP chain in registration order
    ///
    /// Stops at the first handler asking for a reset and returns its index.
    pub fn evaluate_tcp(&self, src: IpAddr, dst: IpAddr, payload: &[u8]) -> Option<usize> {
        self.tcp
            .iter()
            .position(|h| h.evaluate(src, dst, payload).is_reset())
    }

    /// Run every UDP observer in registration order
    pub fn observe_udp(&self, src: IpAddr, dst: IpAddr, payload: &[u8]) {
        for h in self.udp.iter() {
            h.observe(src, dst, payload);
        }
    }

    /// Run every IP observer in registration order
    pub fn observe_ip(&self, src: IpAddr, dst: IpAddr, payload: &[u8]) {
        for h in self.ip.iter() {
            h.observe(src, dst, payload);
        }
    }

    /// Name of the TCP handler at `index`
    pub fn tcp_name(&self, index: usize) -> Option<&str> {
        self.tcp.get(index).map(|h| h.name())
    }

    /// Number of TCP handlers
    pub fn tcp_len(&self) -> usize {
        self.tcp.len()
    }

    /// Number of UDP handlers
    pub fn udp_len(&self) -> usize {
        self.udp.len()
    }

    /// Number of IP handlers
    pub fn ip_len(&self) -> usize {
        self.ip.len()
    }
}

impl Default for Handlers {
    fn default() -> Self {
        HandlersBuilder::default().build()
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handlers")
            .field("tcp", &self.tcp.iter().map(|h| h.name()).collect::<Vec<_>>())
            .field("udp", &self.udp.iter().map(|h| h.name()).collect::<Vec<_>>())
            .field("ip", &self.ip.iter().map(|h| h.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`Handlers`]
#[derive(Default)]
pub struct HandlersBuilder {
    tcp: Vec<Arc<dyn TcpHandler>>,
    udp: Vec<Arc<dyn UdpHandler>>,
    ip: Vec<Arc<dyn IpHandler>>,
}

impl HandlersBuilder {
    /// Append a TCP handler
    pub fn tcp<H: TcpHandler + 'static>(mut self, handler: H) -> Self {
        self.tcp.push(Arc::new(handler));
        self
    }

    /// Append a UDP observer
    pub fn udp<H: UdpHandler + 'static>(mut self, handler: H) -> Self {
        self.udp.push(Arc::new(handler));
        self
    }

    /// Append an IP observer
    pub fn ip<H: IpHandler + 'static>(mut self, handler: H) -> Self {
        self.ip.push(Arc::new(handler));
        self
    }

    /// Append an already shared TCP handler
    pub fn tcp_shared(mut self, handler: Arc<dyn TcpHandler>) -> Self {
        self.tcp.push(handler);
        self
    }

    /// Freeze the registries
    pub fn build(self) -> Handlers {
        Handlers {
            tcp: self.tcp.into(),
            udp: self.udp.into(),
            ip: self.ip.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::sync::Mutex;

    const A: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
    const B: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 2));

    struct Recording {
        id: usize,
        verdict: Verdict,
        calls: Arc<Mutex<Vec<usize>>>,
    }

    impl TcpHandler for Recording {
        fn evaluate(&self, _src: IpAddr, _dst: IpAddr, _payload: &[u8]) -> Verdict {
            self.calls.lock().unwrap().push(self.id);
            self.verdict
        }
    }

    #[test]
    fn test_first_reset_short_circuits() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let verdicts = [Verdict::Pass, Verdict::Reset, Verdict::Reset];
        let mut builder = Handlers::builder();
        for (id, verdict) in verdicts.into_iter().enumerate() {
            builder = builder.tcp(Recording { id, verdict, calls: calls.clone() });
        }
        let handlers = builder.build();

        assert_eq!(handlers.evaluate_tcp(A, B, b""), Some(1));
        assert_eq!(*calls.lock().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_no_reset() {
        let handlers = Handlers::builder()
            .tcp(|_: IpAddr, _: IpAddr, _: &[u8]| false)
            .build();
        assert_eq!(handlers.evaluate_tcp(A, B, b"payload"), None);
    }

    #[test]
    fn test_closure_receives_arguments() {
        let handlers = Handlers::builder()
            .tcp(|src: IpAddr, dst: IpAddr, payload: &[u8]| src == A && dst == B && payload == b"x")
            .build();
        assert_eq!(handlers.evaluate_tcp(A, B, b"x"), Some(0));
        assert_eq!(handlers.evaluate_tcp(B, A, b"x"), None);
    }

    #[test]
    fn test_observers_run_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let (s1, s2, s3) = (seen.clone(), seen.clone(), seen.clone());
        let handlers = Handlers::builder()
            .udp(move |_: IpAddr, _: IpAddr, _: &[u8]| s1.lock().unwrap().push("udp1"))
            .udp(move |_: IpAddr, _: IpAddr, _: &[u8]| s2.lock().unwrap().push("udp2"))
            .ip(move |_: IpAddr, _: IpAddr, _: &[u8]| s3.lock().unwrap().push("ip"))
            .build();

        handlers.observe_udp(A, B, b"");
        handlers.observe_ip(A, B, b"");
        assert_eq!(*seen.lock().unwrap(), vec!["udp1", "udp2", "ip"]);
    }

    #[test]
    fn test_verdict_from_bool() {
        assert_eq!(Verdict::from(true), Verdict::Reset);
        assert_eq!(Verdict::from(false), Verdict::Pass);
        assert!(!Verdict::default().is_reset());
    }
}
