//! Inspect command - decode one frame offline

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use oob_core::packet::{DecodedView, LayerDecoder, NetworkLayer};
use oob_core::{RstSynthesizer, SynthConfig};

/// Inspect command arguments
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Frame bytes as hex, starting at the Ethernet header (whitespace and `:` allowed)
    pub frame: String,

    /// Also print the reset frame the engine would inject
    #[arg(short, long)]
    pub reset: bool,
}

/// Execute inspect command
pub fn execute(args: InspectArgs) -> Result<()> {
    let frame = parse_hex(&args.frame)?;
    let mut decoder = LayerDecoder::new();
    let view = decoder.decode(&frame);

    for line in describe(view, &frame) {
        println!("{line}");
    }

    if args.reset {
        let rst = RstSynthesizer::new(SynthConfig::default())
            .synthesize(view)
            .context("Frame cannot be reset")?;
        println!("{} {}", "reset:".bold(), hex::encode(&rst));
    }
    Ok(())
}

/// Decode user-supplied hex, ignoring separators and a `0x` prefix
pub fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let input = input.trim();
    let input = input.strip_prefix("0x").unwrap_or(input);
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();
    hex::decode(&cleaned).context("Frame is not valid hex")
}

/// Human-readable summary of a decoded frame
pub fn describe(view: &DecodedView, frame: &[u8]) -> Vec<String> {
    let mut lines = vec![format!("{} {} bytes, layers {:?}", "frame:".bold(), frame.len(), view.layers)];

    if view.layers.is_empty() {
        lines.push("  too short for an Ethernet header".to_string());
        return lines;
    }
    lines.push(format!(
        "{} {} -> {} type {:#06x}",
        "ethernet:".bold(),
        view.src_mac,
        view.dst_mac,
        view.ethertype
    ));

    match view.network {
        Some(NetworkLayer::V4 { src, dst, ttl, identification }) => lines.push(format!(
            "{} {src} -> {dst} ttl {ttl} id {identification}",
            "ipv4:".bold()
        )),
        Some(NetworkLayer::V6 { src, dst, hop_limit, flow_label }) => lines.push(format!(
            "{} {src} -> {dst} hop limit {hop_limit} flow {flow_label:#07x}",
            "ipv6:".bold()
        )),
        None => {
            lines.push("  not IP; the engine discards this frame".yellow().to_string());
            return lines;
        }
    }

    if let Some(tcp) = view.tcp {
        lines.push(format!(
            "{} {} -> {} seq {} ack {} win {} flags {} payload {}",
            "tcp:".bold(),
            tcp.src_port,
            tcp.dst_port,
            tcp.sequence,
            tcp.acknowledgement,
            tcp.window,
            tcp.flags,
            tcp.payload_len
        ));
    } else if let Some(udp) = view.udp {
        lines.push(format!(
            "{} {} -> {} payload {}",
            "udp:".bold(),
            udp.src_port,
            udp.dst_port,
            view.payload(frame).len()
        ));
    } else {
        lines.push(format!("{} {} bytes", "ip payload:".bold(), view.payload(frame).len()));
    }

    match view.checksums_valid(frame) {
        Some(true) => lines.push(format!("{} {}", "checksums:".bold(), "ok".green())),
        Some(false) => lines.push(format!("{} {}", "checksums:".bold(), "BAD".red())),
        None => {}
    }
    lines
}
