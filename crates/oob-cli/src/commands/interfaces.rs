//! Interfaces command - list capture devices

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use oob_platform::list_interfaces;

/// Interfaces command arguments
#[derive(Args, Debug)]
pub struct InterfacesArgs {
    /// Also show interfaces that are down or unaddressed
    #[arg(short, long)]
    pub all: bool,
}

/// Execute interfaces command
pub fn execute(args: InterfacesArgs) -> Result<()> {
    let interfaces = list_interfaces();
    let default = interfaces.iter().position(|i| i.is_default_candidate());

    for (idx, info) in interfaces.iter().enumerate() {
        if !args.all && !info.up {
            continue;
        }
        let marker = if Some(idx) == default {
            "*".green().bold()
        } else {
            " ".normal()
        };
        let mut line = info.to_string();
        if info.loopback {
            line.push_str(" [loopback]");
        }
        if !info.up {
            line.push_str(" [down]");
        }
        println!("{marker} {line}");
    }

    if default.is_none() {
        println!("{}", "No usable default interface; pass --interface to `oob run`".yellow());
    }
    Ok(())
}
