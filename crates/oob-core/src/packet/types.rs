//! Packet type definitions

use bitflags::bitflags;
use std::fmt;

/// IP version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpVersion {
    /// IPv4
    V4,
    /// IPv6
    V6,
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => f.write_str("IPv4"),
            IpVersion::V6 => f.write_str("IPv6"),
        }
    }
}

bitflags! {
    /// Layers recognized while decoding a frame
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Layers: u8 {
        /// Ethernet II header
        const ETHERNET = 0b0000_0001;
        /// IPv4 header
        const IPV4 = 0b0000_0010;
        /// IPv6 header
        const IPV6 = 0b0000_0100;
        /// TCP header
        const TCP = 0b0000_1000;
        /// UDP header
        const UDP = 0b0001_0000;
        /// Non-empty transport payload
        const PAYLOAD = 0b0010_0000;
    }
}

impl Layers {
    /// Whether an IPv4 or IPv6 layer was recognized
    pub fn has_network(self) -> bool {
        self.intersects(Layers::IPV4 | Layers::IPV6)
    }
}

/// TCP flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpFlags {
    /// FIN flag
    pub fin: bool,
    /// SYN flag
    pub syn: bool,
    /// RST flag
    pub rst: bool,
    /// PSH flag
    pub psh: bool,
    /// ACK flag
    pub ack: bool,
    /// URG flag
    pub urg: bool,
    /// ECE flag
    pub ece: bool,
    /// CWR flag
    pub cwr: bool,
}

impl TcpFlags {
    /// Flags of a bare reset segment
    pub const RST_ONLY: TcpFlags = TcpFlags {
        fin: false,
        syn: false,
        rst: true,
        psh: false,
        ack: false,
        urg: false,
        ece: false,
        cwr: false,
    };

    /// Create from TCP flags byte
    pub fn from_byte(byte: u8) -> Self {
        Self {
            fin: byte & 0x01 != 0,
            syn: byte & 0x02 != 0,
            rst: byte & 0x04 != 0,
            psh: byte & 0x08 != 0,
            ack: byte & 0x10 != 0,
            urg: byte & 0x20 != 0,
            ece: byte & 0x40 != 0,
            cwr: byte & 0x80 != 0,
        }
    }

    /// Convert to byte
    pub fn to_byte(self) -> u8 {
        let mut byte = 0u8;
        if self.fin { byte |= 0x01; }
        if self.syn { byte |= 0x02; }
        if self.rst { byte |= 0x04; }
        if self.psh { byte |= 0x08; }
        if self.ack { byte |= 0x10; }
        if self.urg { byte |= 0x20; }
        if self.ece { byte |= 0x40; }
        if self.cwr { byte |= 0x80; }
        byte
    }
}

impl fmt::Display for TcpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [
            (self.syn, "SYN"),
            (self.ack, "ACK"),
            (self.psh, "PSH"),
            (self.fin, "FIN"),
            (self.rst, "RST"),
            (self.urg, "URG"),
            (self.ece, "ECE"),
            (self.cwr, "CWR"),
        ];
        let set: Vec<&str> = names.iter().filter(|(on, _)| *on).map(|(_, n)| *n).collect();
        if set.is_empty() {
            f.write_str("-")
        } else {
            f.write_str(&set.join("|"))
        }
    }
}
