//! Configuration management for the traffic engine
//!
//! Strongly-typed configuration with TOML support. Every section falls back
//! to its defaults, so an empty file is a valid configuration.

use crate::error::{Error, Result};
use crate::synth::SynthConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default ingress/egress queue capacity, in frames
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pipeline sizing
    pub engine: EngineConfig,

    /// Reset frame serialization
    pub synth: SynthConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| Error::ConfigNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }
}

/// Worker pool and queue sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of decode/dispatch workers (0 = one per logical CPU)
    pub workers: usize,
    /// Ingress queue capacity in frames
    pub ingress_capacity: usize,
    /// Egress queue capacity in frames
    pub egress_capacity: usize,
    /// How often idle workers re-check whether the input has closed
    pub poll_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            ingress_capacity: DEFAULT_QUEUE_CAPACITY,
            egress_capacity: DEFAULT_QUEUE_CAPACITY,
            poll_interval_ms: 50,
        }
    }
}

impl EngineConfig {
    /// Worker count after resolving `0` to the CPU count
    pub fn worker_count(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get().max(1)
        } else {
            self.workers
        }
    }

    /// Poll interval as a [`Duration`]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate sizing values
    pub fn validate(&self) -> Result<()> {
        if self.ingress_capacity == 0 {
            return Err(Error::config_value(
                "engine.ingress_capacity",
                "Must be greater than 0",
            ));
        }
        if self.egress_capacity == 0 {
            return Err(Error::config_value(
                "engine.egress_capacity",
                "Must be greater than 0",
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::config_value(
                "engine.poll_interval_ms",
                "Must be greater than 0",
            ));
        }
        Ok(())
    }
}
