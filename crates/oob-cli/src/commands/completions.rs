//! Shell completions generator

use anyhow::{Context, Result};
use clap::{Args, CommandFactory};
use clap_complete::{generate, generate_to, Shell};
use std::io;
use std::path::PathBuf;

use crate::args::Args as CliArgs;

/// Completions command arguments
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,

    /// Write the script into this directory instead of stdout
    #[arg(short, long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

/// Execute completions command
pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = CliArgs::command();
    let name = cmd.get_name().to_string();

    match args.out_dir {
        Some(dir) => {
            let path = generate_to(args.shell, &mut cmd, name, &dir)
                .with_context(|| format!("Failed to write completions to {}", dir.display()))?;
            println!("Completions written to {}", path.display());
        }
        None => generate(args.shell, &mut cmd, name, &mut io::stdout()),
    }

    Ok(())
}
