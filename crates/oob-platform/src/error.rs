//! Platform-specific errors

use thiserror::Error;

/// Platform-specific errors
#[derive(Error, Debug)]
pub enum PlatformError {
    /// No interface with the requested name
    #[error("Interface not found: {0}")]
    InterfaceNotFound(String),

    /// No interface is up, non-loopback and addressed
    #[error("No usable capture interface found")]
    NoInterface,

    /// The interface does not provide an Ethernet channel
    #[error("Unsupported channel type on {0}")]
    UnsupportedChannel(String),

    /// Opening the link-layer channel requires more privileges
    #[error("Permission denied opening {0} (raw capture needs root or CAP_NET_RAW)")]
    PermissionDenied(String),

    /// Opening the link-layer channel failed
    #[error("Failed to open channel on {interface}: {source}")]
    ChannelOpen {
        /// Interface name
        interface: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },
}

/// Platform result type
pub type Result<T> = std::result::Result<T, PlatformError>;
