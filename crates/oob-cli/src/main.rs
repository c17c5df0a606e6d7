//! oob CLI
//!
//! Command-line interface for the out-of-band TCP reset engine.

mod args;
mod commands;
mod logging;
mod policy;
mod settings;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use args::Args;
use commands::Command;
use settings::AppConfig;

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    let (settings, source) = AppConfig::resolve(args.config.as_deref())?;

    // Initialize logging; the guard flushes the log file on exit
    let _guard = logging::init(&args, &settings.logging)?;

    if matches!(args.command, Command::Run(_)) && !args.quiet {
        print_banner();
    }

    let result = run(args, settings, source);

    if let Err(ref e) = result {
        error!("Fatal error: {:#}", e);
    }

    result
}

fn run(args: Args, settings: AppConfig, source: Option<std::path::PathBuf>) -> Result<()> {
    match args.command {
        Command::Run(run_args) => commands::run::execute(run_args, settings),
        Command::Interfaces(list_args) => commands::interfaces::execute(list_args),
        Command::Inspect(inspect_args) => commands::inspect::execute(inspect_args),
        Command::Config(config_args) => {
            commands::config::execute(config_args, &settings, source.as_deref())
        }
        Command::Completions(comp_args) => commands::completions::execute(comp_args),
    }
}

fn print_banner() {
    use colored::Colorize;

    println!();
    println!("{}", "╔═══════════════════════════════════════════════════════╗".cyan());
    println!(
        "{}{}{}",
        "║  ".cyan(),
        format!("oob v{:<10}", env!("CARGO_PKG_VERSION")).green().bold(),
        "                                      ║".cyan()
    );
    println!(
        "{}{}{}",
        "║  ".cyan(),
        "out-of-band TCP reset injector".white(),
        "                       ║".cyan()
    );
    println!("{}", "╚═══════════════════════════════════════════════════════╝".cyan());
    println!();
}
