//! Application settings file
//!
//! The engine sections (`[engine]`, `[synth]`) are the core configuration;
//! the CLI adds the capture interface, the blocking policy and logging.

use anyhow::{Context, Result};
use oob_core::Config;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Level;

use crate::args::LogFormat;

/// File names looked up in the working directory
const LOCAL_CANDIDATES: [&str; 2] = ["oob.toml", "config.toml"];

/// Full settings file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Default capture interface
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,

    /// Engine sections
    #[serde(flatten)]
    pub core: Config,

    /// Blocking policy
    pub policy: PolicyConfig,

    /// Logging
    pub logging: LoggingConfig,
}

/// Hosts to cut off
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Host names; subdomains are matched too
    pub hosts: Vec<String>,
    /// File with one host per line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocklist: Option<PathBuf>,
}

/// Logging defaults, overridden by command-line flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level when no -v/-q flag is given
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Also write logs to this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parsed level
    pub fn level(&self) -> Result<Level> {
        self.level
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid log level '{}'", self.level))
    }
}

impl AppConfig {
    /// Load and validate a settings file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load `explicit`, or the first discovered file, or defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file(),
        };
        match path {
            Some(path) => Ok((Self::load(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.core.validate()?;
        self.logging.level()?;
        if self.policy.hosts.iter().any(|h| h.trim().is_empty()) {
            anyhow::bail!("policy.hosts contains an empty entry");
        }
        Ok(())
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}

/// Per-user config directory
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "oob").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Search the working directory, then the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    LOCAL_CANDIDATES
        .into_iter()
        .map(PathBuf::from)
        .chain(user_config_path())
        .find(|path| path.exists())
}
