//! Config command - configuration management

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::settings::{user_config_path, AppConfig};

/// Config command arguments
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Write a configuration file with every default spelled out
    Init {
        /// Output file path
        #[arg(default_value = "oob.toml")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Config file to validate
        file: PathBuf,
    },

    /// Show config file locations
    Paths,
}

/// Execute config command
pub fn execute(args: ConfigArgs, settings: &AppConfig, source: Option<&Path>) -> Result<()> {
    match args.action {
        ConfigAction::Show => show_config(settings, source),
        ConfigAction::Init { output, force } => init_config(&output, force),
        ConfigAction::Validate { file } => validate_config(&file),
        ConfigAction::Paths => show_paths(),
    }
}

fn show_config(settings: &AppConfig, source: Option<&Path>) -> Result<()> {
    match source {
        Some(path) => println!("# Loaded from {}", path.display()),
        None => println!("# Built-in defaults"),
    }
    println!("{}", settings.to_toml()?);
    Ok(())
}

fn init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }

    let content = format!(
        "# oob configuration\n\
         # engine.workers = 0 uses one worker per CPU\n\n\
         {}",
        AppConfig::default().to_toml()?
    );

    std::fs::write(output, content)
        .with_context(|| format!("Failed to write config to {}", output.display()))?;

    info!(path = %output.display(), "Generated config file");
    println!("Configuration file generated: {}", output.display());
    Ok(())
}

fn validate_config(file: &Path) -> Result<()> {
    let config = AppConfig::load(file)?;

    println!("{} Configuration is valid", "✓".green());
    println!("  Workers: {}", config.core.engine.worker_count());
    println!(
        "  Queues: {} ingress / {} egress",
        config.core.engine.ingress_capacity, config.core.engine.egress_capacity
    );
    println!("  Checksums: {}", config.core.synth.compute_checksums);
    println!("  Hosts: {}", config.policy.hosts.len());
    if let Some(ref blocklist) = config.policy.blocklist {
        println!("  Blocklist: {}", blocklist.display());
    }
    if let Some(ref interface) = config.interface {
        println!("  Interface: {interface}");
    }
    Ok(())
}

fn show_paths() -> Result<()> {
    println!("Configuration file search paths:");
    println!();
    println!("  1. ./oob.toml");
    println!("  2. ./config.toml");
    if let Some(path) = user_config_path() {
        println!("  3. {}", path.display());
    }
    println!();
    println!("Override with -c/--config or OOB_CONFIG.");
    Ok(())
}
