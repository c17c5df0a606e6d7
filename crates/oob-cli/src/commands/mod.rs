//! CLI commands

pub mod completions;
pub mod config;
pub mod inspect;
pub mod interfaces;
pub mod run;

use clap::Subcommand;

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inject resets into flows requesting blocked hosts (main command)
    Run(run::RunArgs),

    /// List capture interfaces
    Interfaces(interfaces::InterfacesArgs),

    /// Decode a hex-encoded Ethernet frame
    Inspect(inspect::InspectArgs),

    /// Configuration management
    Config(config::ConfigArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}
