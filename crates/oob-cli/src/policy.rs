//! Host-header blocking policy
//!
//! Resets any TCP flow whose payload carries an HTTP `Host:` header naming a
//! blocked host or one of its subdomains.

use anyhow::{Context, Result};
use oob_core::{TcpHandler, Verdict};
use std::collections::HashSet;
use std::net::IpAddr;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Resets flows requesting a blocked host
#[derive(Debug, Default)]
pub struct HostHeaderPolicy {
    hosts: HashSet<String>,
    hits: AtomicU64,
}

impl HostHeaderPolicy {
    /// Build from host names, normalized to lowercase
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hosts = hosts
            .into_iter()
            .map(|h| normalize(h.as_ref()))
            .filter(|h| !h.is_empty())
            .collect();
        Self {
            hosts,
            hits: AtomicU64::new(0),
        }
    }

    /// Number of distinct blocked hosts
    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    /// Check if nothing is blocked
    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Number of flows reset so far
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Whether `host` or any parent domain is blocked
    pub fn blocks(&self, host: &str) -> bool {
        let host = normalize(host);
        let mut candidate = host.as_str();
        loop {
            if self.hosts.contains(candidate) {
                return true;
            }
            match candidate.split_once('.') {
                Some((_, parent)) if !parent.is_empty() => candidate = parent,
                _ => return false,
            }
        }
    }
}

impl TcpHandler for HostHeaderPolicy {
    fn evaluate(&self, src: IpAddr, dst: IpAddr, payload: &[u8]) -> Verdict {
        let Some(host) = host_header(payload) else {
            return Verdict::Pass;
        };
        if !self.blocks(host) {
            return Verdict::Pass;
        }

        self.hits.fetch_add(1, Ordering::Relaxed);
        debug!(%src, %dst, host, "Blocked host requested");
        Verdict::Reset
    }

    fn name(&self) -> &str {
        "host-header"
    }
}

/// Value of the first `Host:` header in an HTTP request head, port stripped
pub fn host_header(payload: &[u8]) -> Option<&str> {
    let mut lines = payload.split(|&b| b == b'\n');
    // Request line
    lines.next()?;

    for line in lines {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            break;
        }
        if line.len() < 5 || !line[..5].eq_ignore_ascii_case(b"host:") {
            continue;
        }
        let value = std::str::from_utf8(&line[5..]).ok()?.trim();
        return Some(strip_port(value)).filter(|h| !h.is_empty());
    }
    None
}

fn strip_port(value: &str) -> &str {
    if let Some(rest) = value.strip_prefix('[') {
        // IPv6 literal
        return rest.split_once(']').map_or(rest, |(addr, _)| addr);
    }
    match value.rsplit_once(':') {
        Some((host, port)) if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => host,
        _ => value,
    }
}

fn normalize(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Load a blocklist: one host per line, `#` comments and blank lines skipped
pub fn load_blocklist(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read blocklist file: {}", path.display()))?;

    let hosts = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_lowercase)
        .collect();

    Ok(hosts)
}
