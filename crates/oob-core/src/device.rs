//! Capture and injection device contract
//!
//! The engine reads from a device on exactly one thread and writes to it on
//! exactly one other thread, so implementations only need to make each
//! direction safe on its own.

use bytes::Bytes;
use std::io;
use std::sync::Arc;

/// A link-layer frame source and sink
pub trait Device: Send + Sync {
    /// Block until the next frame is available
    ///
    /// `TimedOut`, `WouldBlock` and `Interrupted` errors are treated as idle
    /// ticks by the engine; any other error ends the run. `TimedOut` should
    /// only be returned after the device has waited; the engine backs off
    /// briefly on `WouldBlock` and retries `Interrupted` at once.
    fn read(&self) -> io::Result<Bytes>;

    /// Inject one frame, best effort
    fn write(&self, frame: &[u8]) -> io::Result<()>;
}

impl<D: Device + ?Sized> Device for Arc<D> {
    fn read(&self) -> io::Result<Bytes> {
        (**self).read()
    }

    fn write(&self, frame: &[u8]) -> io::Result<()> {
        (**self).write(frame)
    }
}

impl<D: Device + ?Sized> Device for Box<D> {
    fn read(&self) -> io::Result<Bytes> {
        (**self).read()
    }

    fn write(&self, frame: &[u8]) -> io::Result<()> {
        (**self).write(frame)
    }
}

/// Whether a read error is an idle tick rather than a failure
pub fn is_idle(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
