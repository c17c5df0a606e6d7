//! Network interface discovery

use crate::error::{PlatformError, Result};
use pnet::datalink::{self, NetworkInterface};
use pnet::util::MacAddr;
use std::fmt;
use std::net::IpAddr;

/// Summary of a capture-capable interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceInfo {
    /// OS name, e.g. `eth0`
    pub name: String,
    /// OS interface index
    pub index: u32,
    /// Hardware address, if the link has one
    pub mac: Option<MacAddr>,
    /// Assigned addresses
    pub ips: Vec<IpAddr>,
    /// Interface is administratively up
    pub up: bool,
    /// Interface is a loopback device
    pub loopback: bool,
}

impl InterfaceInfo {
    /// Whether [`find_interface`] would pick this interface by default
    pub fn is_default_candidate(&self) -> bool {
        self.up && !self.loopback && !self.ips.is_empty()
    }
}

impl From<&NetworkInterface> for InterfaceInfo {
    fn from(iface: &NetworkInterface) -> Self {
        Self {
            name: iface.name.clone(),
            index: iface.index,
            mac: iface.mac,
            ips: iface.ips.iter().map(|net| net.ip()).collect(),
            up: iface.is_up(),
            loopback: iface.is_loopback(),
        }
    }
}

impl fmt::Display for InterfaceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.name, self.index)?;
        if let Some(mac) = self.mac {
            write!(f, " {mac}")?;
        }
        for ip in &self.ips {
            write!(f, " {ip}")?;
        }
        Ok(())
    }
}

/// List every interface the OS reports
pub fn list_interfaces() -> Vec<InterfaceInfo> {
    datalink::interfaces().iter().map(InterfaceInfo::from).collect()
}

/// Find an interface by name, or the first usable one
///
/// Without a name the first interface that is up, not loopback and has at
/// least one address is chosen.
pub fn find_interface(name: Option<&str>) -> Result<NetworkInterface> {
    select(datalink::interfaces(), name)
}

fn select(interfaces: Vec<NetworkInterface>, name: Option<&str>) -> Result<NetworkInterface> {
    match name {
        Some(name) => interfaces
            .into_iter()
            .find(|iface| iface.name == name)
            .ok_or_else(|| PlatformError::InterfaceNotFound(name.to_string())),
        None => interfaces
            .into_iter()
            .find(|iface| InterfaceInfo::from(iface).is_default_candidate())
            .ok_or(PlatformError::NoInterface),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_name() {
        let result = select(Vec::new(), Some("oob-test-missing0"));
        assert!(matches!(result, Err(PlatformError::InterfaceNotFound(ref n)) if n == "oob-test-missing0"));
    }

    #[test]
    fn test_no_candidates() {
        assert!(matches!(select(Vec::new(), None), Err(PlatformError::NoInterface)));
    }

    #[test]
    fn test_listing_matches_lookup() {
        for info in list_interfaces() {
            let iface = find_interface(Some(&info.name)).unwrap();
            assert_eq!(iface.index, info.index);
        }
    }

    #[test]
    fn test_display() {
        let info = InterfaceInfo {
            name: "eth0".into(),
            index: 2,
            mac: Some(MacAddr::new(0x02, 0, 0, 0, 0, 1)),
            ips: vec!["10.0.0.1".parse().unwrap()],
            up: true,
            loopback: false,
        };
        assert_eq!(info.to_string(), "eth0 (#2) 02:00:00:00:00:01 10.0.0.1");
        assert!(info.is_default_candidate());
    }
}
