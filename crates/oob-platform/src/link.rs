//! Live link-layer device over `pnet::datalink`

use crate::error::{PlatformError, Result};
use bytes::Bytes;
use oob_core::Device;
use parking_lot::Mutex;
use pnet::datalink::{self, Channel, DataLinkReceiver, DataLinkSender, NetworkInterface};
use std::io;
use std::time::Duration;
use tracing::{debug, info};

/// Default read timeout; bounds how long a stop request can go unnoticed
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Ethernet capture and injection on one interface
///
/// Reads and writes go through separate locks, so the engine's reader and
/// writer threads never contend with each other.
pub struct LinkDevice {
    name: String,
    rx: Mutex<Box<dyn DataLinkReceiver>>,
    tx: Mutex<Box<dyn DataLinkSender>>,
}

impl LinkDevice {
    /// Open an Ethernet channel on `interface`
    ///
    /// Reads return `TimedOut` after `read_timeout` without traffic.
    pub fn open(interface: &NetworkInterface, read_timeout: Duration) -> Result<Self> {
        let config = datalink::Config {
            read_timeout: Some(read_timeout),
            ..Default::default()
        };

        let (tx, rx) = match datalink::channel(interface, config) {
            Ok(Channel::Ethernet(tx, rx)) => (tx, rx),
            Ok(_) => return Err(PlatformError::UnsupportedChannel(interface.name.clone())),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(PlatformError::PermissionDenied(interface.name.clone()))
            }
            Err(source) => {
                return Err(PlatformError::ChannelOpen {
                    interface: interface.name.clone(),
                    source,
                })
            }
        };

        info!(interface = %interface.name, ?read_timeout, "Link device opened");
        Ok(Self {
            name: interface.name.clone(),
            rx: Mutex::new(rx),
            tx: Mutex::new(tx),
        })
    }

    /// Interface name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Device for LinkDevice {
    fn read(&self) -> io::Result<Bytes> {
        let mut rx = self.rx.lock();
        rx.next().map(Bytes::copy_from_slice)
    }

    fn write(&self, frame: &[u8]) -> io::Result<()> {
        let mut tx = self.tx.lock();
        match tx.send_to(frame, None) {
            Some(result) => result,
            None => {
                debug!(interface = %self.name, len = frame.len(), "No send buffer available");
                Err(io::Error::new(io::ErrorKind::WouldBlock, "no send buffer available"))
            }
        }
    }
}

impl Drop for LinkDevice {
    fn drop(&mut self) {
        debug!(interface = %self.name, "Link device closed");
    }
}
