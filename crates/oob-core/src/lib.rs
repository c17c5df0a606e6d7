//! # oob-core
//!
//! Platform-independent core of the out-of-band TCP reset engine.
//!
//! ## Architecture
//!
//! This crate provides:
//! - **Layer decoding** - Ethernet, IPv4/IPv6, TCP/UDP views over raw frames
//! - **Reset synthesis** - Spoofed RST frames with fresh lengths and checksums
//! - **Handlers** - Pluggable per-protocol inspection callbacks
//! - **Traffic engine** - Reader, worker pool and injection writer over bounded queues
//!
//! Frames are never modified or dropped on the real path; the engine only
//! injects additional frames through the same [`Device`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use oob_core::{Handlers, TrafficEngine, Verdict};
//! # fn open_device() -> Box<dyn oob_core::Device> { unimplemented!() }
//! use std::net::IpAddr;
//!
//! let handlers = Handlers::builder()
//!     .tcp(|_src: IpAddr, _dst: IpAddr, payload: &[u8]| {
//!         Verdict::reset_if(payload.starts_with(b"GET /blocked"))
//!     })
//!     .build();
//!
//! let engine = TrafficEngine::new(handlers);
//! let stop = engine.shutdown_handle();
//! # stop.shutdown();
//! engine.run(open_device())?;
//! # Ok::<(), oob_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod device;
pub mod engine;
pub mod error;
pub mod handler;
pub mod packet;
pub mod synth;

// Re-exports for convenience
pub use config::{Config, EngineConfig};
pub use device::Device;
pub use engine::{ShutdownHandle, Stats, TrafficEngine};
pub use error::{Error, Result};
pub use handler::{Handlers, IpHandler, TcpHandler, UdpHandler, Verdict};
pub use packet::{decode_frame, DecodedView, LayerDecoder};
pub use synth::{RstSynthesizer, SynthConfig};
