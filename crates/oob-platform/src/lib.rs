//! oob Platform Layer
//!
//! Link-layer capture and injection devices for the traffic engine.
//!
//! ## Supported Platforms
//!
//! - **Linux**: `AF_PACKET` sockets through `pnet::datalink`
//! - **macOS / BSD**: BPF devices through `pnet::datalink`

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
pub use error::{PlatformError, Result};

mod interfaces;
pub use interfaces::{find_interface, list_interfaces, InterfaceInfo};

mod link;
pub use link::{LinkDevice, DEFAULT_READ_TIMEOUT};

pub use pnet::datalink::NetworkInterface;
