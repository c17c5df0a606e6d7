//! Error types for oob-core
//!
//! Centralized error handling using `thiserror` for ergonomic error definitions.

use thiserror::Error;

/// Main error type for oob-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// The capture device failed to deliver a frame
    #[error("Capture device read failed: {0}")]
    Capture(#[source] std::io::Error),

    /// Frame decoding failed
    #[error("Packet parsing error: {message}")]
    PacketParse {
        /// Detailed error message
        message: String,
        /// Offset in frame where error occurred
        offset: Option<usize>,
    },

    /// Frame is too small to hold the header being decoded
    #[error("Packet too small: expected at least {expected} bytes, got {actual}")]
    PacketTooSmall {
        /// Minimum expected size
        expected: usize,
        /// Actual frame size
        actual: usize,
    },

    /// A reset frame could not be built
    #[error("RST synthesis failed: {0}")]
    Synthesis(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path to the missing config file
        path: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    ConfigValue {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    /// A worker or writer thread could not be started
    #[error("Failed to spawn {role} thread: {source}")]
    Spawn {
        /// Thread role ("worker", "writer")
        role: &'static str,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Every worker exited while the reader was still producing
    #[error("All workers stopped unexpectedly")]
    WorkersStopped,

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a packet parse error
    pub fn packet_parse(message: impl Into<String>) -> Self {
        Self::PacketParse {
            message: message.into(),
            offset: None,
        }
    }

    /// Create a packet parse error with offset
    pub fn packet_parse_at(message: impl Into<String>, offset: usize) -> Self {
        Self::PacketParse {
            message: message.into(),
            offset: Some(offset),
        }
    }

    /// Create a synthesis error
    pub fn synthesis(message: impl Into<String>) -> Self {
        Self::Synthesis(message.into())
    }

    /// Create a config value error
    pub fn config_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Whether this error ends the engine's run loop
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Capture(_) | Self::Spawn { .. } | Self::WorkersStopped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::packet_parse("Invalid header");
        assert!(err.to_string().contains("Invalid header"));

        let err = Error::synthesis("no network layer");
        assert!(err.to_string().contains("RST synthesis failed"));
        assert!(err.to_string().contains("no network layer"));
    }

    #[test]
    fn test_error_with_offset() {
        let err = Error::packet_parse_at("Invalid byte", 42);
        match err {
            Error::PacketParse { offset, .. } => assert_eq!(offset, Some(42)),
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_fatal_classification() {
        let read = Error::Capture(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"));
        assert!(read.is_fatal());
        assert!(!Error::synthesis("x").is_fatal());
        assert!(!Error::packet_parse("x").is_fatal());
        assert!(Error::WorkersStopped.is_fatal());
        assert!(!Error::config_value("engine.workers", "x").is_fatal());
    }
}
