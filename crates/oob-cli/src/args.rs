//! Command-line argument parsing

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::commands::Command;

/// oob - out-of-band TCP reset injector
///
/// Watches traffic on a network interface and tears down TCP flows that
/// match a policy by injecting spoofed RST segments next to the real packets.
#[derive(Parser, Debug)]
#[command(name = "oob")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", global = true, env = "OOB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format for logs
    #[arg(long, value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    /// Log file path
    #[arg(long, value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON format
    Json,
    /// Compact format
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    #[test]
    fn test_verbose() {
        let args = Args::parse_from(["oob", "interfaces", "-v"]);
        assert_eq!(args.verbose, 1);

        let args = Args::parse_from(["oob", "-vvv", "interfaces"]);
        assert_eq!(args.verbose, 3);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Args::try_parse_from(["oob", "-q", "-v", "interfaces"]).is_err());
    }

    #[test]
    fn test_run_hosts() {
        let args = Args::parse_from([
            "oob", "run", "-i", "eth0", "--host", "a.example", "--host", "b.example",
        ]);
        match args.command {
            Command::Run(run) => {
                assert_eq!(run.interface.as_deref(), Some("eth0"));
                assert_eq!(run.hosts, vec!["a.example", "b.example"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_log_format() {
        let args = Args::parse_from(["oob", "--log-format", "json", "interfaces"]);
        assert_eq!(args.log_format, Some(LogFormat::Json));
    }
}
