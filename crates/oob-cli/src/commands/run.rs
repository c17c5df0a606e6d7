//! Run command - live reset injection

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use oob_core::{Handlers, Stats, TcpHandler, TrafficEngine};
use oob_platform::{find_interface, LinkDevice};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::policy::{load_blocklist, HostHeaderPolicy};
use crate::settings::AppConfig;

/// Run command arguments
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Interface to capture on (default: first usable)
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Block a host and its subdomains (repeatable)
    #[arg(long = "host", value_name = "HOST")]
    pub hosts: Vec<String>,

    /// Blocklist file, one host per line
    #[arg(short, long, value_name = "FILE")]
    pub blocklist: Option<PathBuf>,

    /// Worker threads (default: config, then one per CPU)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Capture read timeout in milliseconds
    #[arg(long, default_value_t = 100)]
    pub read_timeout_ms: u64,

    /// Resolve policy and interface, then exit without capturing
    #[arg(long)]
    pub dry_run: bool,
}

/// Execute the run command
pub fn execute(args: RunArgs, settings: AppConfig) -> Result<()> {
    let policy = Arc::new(build_policy(&args, &settings)?);
    if policy.is_empty() {
        bail!("No hosts to block; pass --host, --blocklist or set [policy] in the config file");
    }
    info!(hosts = policy.len(), "Loaded host policy");

    let mut config = settings.core.clone();
    if let Some(workers) = args.workers {
        config.engine.workers = workers;
    }

    let interface_name = args.interface.as_deref().or(settings.interface.as_deref());
    let interface = find_interface(interface_name).context("Failed to select capture interface")?;
    info!(interface = %interface.name, "Selected interface");

    let handlers = Handlers::builder()
        .tcp_shared(policy.clone() as Arc<dyn TcpHandler>)
        .build();
    let engine = TrafficEngine::from_config(handlers, &config).context("Invalid engine configuration")?;

    if args.dry_run {
        warn!("Dry run mode - no traffic will be captured");
        info!(workers = config.engine.worker_count(), "Configuration validated successfully");
        return Ok(());
    }

    let device = LinkDevice::open(&interface, Duration::from_millis(args.read_timeout_ms))
        .with_context(|| format!("Failed to open {}", interface.name))?;

    // Set up signal handler
    let stop = engine.shutdown_handle();
    ctrlc::set_handler(move || {
        info!("Received interrupt signal, shutting down...");
        stop.shutdown();
    })
    .context("Failed to set signal handler")?;

    let result = engine.run(device);
    print_summary(&engine.stats(), policy.hits());
    result.context("Capture stopped")
}

fn build_policy(args: &RunArgs, settings: &AppConfig) -> Result<HostHeaderPolicy> {
    let mut hosts: Vec<String> = settings.policy.hosts.clone();
    hosts.extend(args.hosts.iter().cloned());

    for path in settings.policy.blocklist.iter().chain(args.blocklist.iter()) {
        let listed = load_blocklist(path)?;
        info!(path = %path.display(), count = listed.len(), "Loaded blocklist");
        hosts.extend(listed);
    }

    Ok(HostHeaderPolicy::new(hosts))
}

fn print_summary(stats: &Stats, hits: u64) {
    println!();
    println!("{}", "Session summary".bold());
    println!("  frames read:        {}", stats.frames_read);
    println!("  frames processed:   {}", stats.frames_processed);
    println!("  non-IP discarded:   {}", stats.frames_discarded);
    println!("  tcp / udp / ip:     {} / {} / {}", stats.tcp_dispatched, stats.udp_dispatched, stats.ip_dispatched);
    println!("  policy hits:        {}", hits.to_string().yellow());
    println!("  resets injected:    {}", stats.frames_injected.to_string().green());
    if stats.synthesis_failed > 0 || stats.write_failed > 0 {
        println!(
            "  failures:           {} synthesis, {} write",
            stats.synthesis_failed.to_string().red(),
            stats.write_failed.to_string().red()
        );
    }
}
