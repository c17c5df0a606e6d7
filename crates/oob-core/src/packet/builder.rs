//! Frame builder utilities
//!
//! Builds complete Ethernet frames with valid lengths and checksums. Used to
//! craft test traffic and hand-made frames for `oob inspect`.

use super::checksum;
use super::{IpVersion, TcpFlags, ETHERNET_HEADER_LEN, IPV4_HEADER_LEN, IPV6_HEADER_LEN};
use bytes::{BufMut, BytesMut};
use pnet::util::MacAddr;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

const PROTO_TCP: u8 = 6;
const PROTO_UDP: u8 = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Tcp,
    Udp,
}

/// Builder for constructing Ethernet frames
#[derive(Debug, Clone)]
pub struct FrameBuilder {
    ip_version: IpVersion,
    transport: Transport,
    src_mac: MacAddr,
    dst_mac: MacAddr,
    src_ip: IpAddr,
    dst_ip: IpAddr,
    src_port: u16,
    dst_port: u16,
    ttl: u8,
    identification: u16,
    flow_label: u32,
    tcp_flags: TcpFlags,
    seq: u32,
    ack: u32,
    window: u16,
    payload: Vec<u8>,
}

impl FrameBuilder {
    fn new(ip_version: IpVersion, transport: Transport) -> Self {
        let (src_ip, dst_ip) = match ip_version {
            IpVersion::V4 => (
                IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            ),
            IpVersion::V6 => (
                IpAddr::V6(Ipv6Addr::UNSPECIFIED),
                IpAddr::V6(Ipv6Addr::UNSPECIFIED),
            ),
        };

        Self {
            ip_version,
            transport,
            src_mac: MacAddr(0x02, 0, 0, 0, 0, 0x01),
            dst_mac: MacAddr(0x02, 0, 0, 0, 0, 0x02),
            src_ip,
            dst_ip,
            src_port: 0,
            dst_port: 0,
            ttl: 64,
            identification: 0,
            flow_label: 0,
            tcp_flags: TcpFlags {
                ack: true,
                psh: true,
                ..Default::default()
            },
            seq: 0,
            ack: 0,
            window: 0xFFFF,
            payload: Vec::new(),
        }
    }

    /// Create new IPv4 TCP frame builder
    pub fn tcp_v4() -> Self {
        Self::new(IpVersion::V4, Transport::Tcp)
    }

    /// Create new IPv6 TCP frame builder
    pub fn tcp_v6() -> Self {
        Self::new(IpVersion::V6, Transport::Tcp)
    }

    /// Create new IPv4 UDP frame builder
    pub fn udp_v4() -> Self {
        Self::new(IpVersion::V4, Transport::Udp)
    }

    /// Create new IPv6 UDP frame builder
    pub fn udp_v6() -> Self {
        Self::new(IpVersion::V6, Transport::Udp)
    }

    /// Set source and destination hardware addresses
    pub fn macs(mut self, src: MacAddr, dst: MacAddr) -> Self {
        self.src_mac = src;
        self.dst_mac = dst;
        self
    }

    /// Set source IP (IPv4)
    pub fn src_ip_v4(mut self, ip: [u8; 4]) -> Self {
        self.src_ip = IpAddr::V4(Ipv4Addr::from(ip));
        self
    }

    /// Set destination IP (IPv4)
    pub fn dst_ip_v4(mut self, ip: [u8; 4]) -> Self {
        self.dst_ip = IpAddr::V4(Ipv4Addr::from(ip));
        self
    }

    /// Set source IP (IPv6)
    pub fn src_ip_v6(mut self, ip: Ipv6Addr) -> Self {
        self.src_ip = IpAddr::V6(ip);
        self
    }

    /// Set destination IP (IPv6)
    pub fn dst_ip_v6(mut self, ip: Ipv6Addr) -> Self {
        self.dst_ip = IpAddr::V6(ip);
        self
    }

    /// Set source port
    pub fn src_port(mut self, port: u16) -> Self {
        self.src_port = port;
        self
    }

    /// Set destination port
    pub fn dst_port(mut self, port: u16) -> Self {
        self.dst_port = port;
        self
    }

    /// Set TTL
    pub fn ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set hop limit (IPv6 name for TTL)
    pub fn hop_limit(self, hop_limit: u8) -> Self {
        self.ttl(hop_limit)
    }

    /// Set IPv4 identification
    pub fn identification(mut self, id: u16) -> Self {
        self.identification = id;
        self
    }

    /// Set IPv6 flow label (low 20 bits are used)
    pub fn flow_label(mut self, label: u32) -> Self {
        self.flow_label = label & 0x000F_FFFF;
        self
    }

    /// Set TCP flags
    pub fn flags(mut self, flags: TcpFlags) -> Self {
        self.tcp_flags = flags;
        self
    }

    /// Set sequence number
    pub fn seq(mut self, seq: u32) -> Self {
        self.seq = seq;
        self
    }

    /// Set acknowledgment number
    pub fn ack(mut self, ack: u32) -> Self {
        self.ack = ack;
        self
    }

    /// Set receive window
    pub fn window(mut self, window: u16) -> Self {
        self.window = window;
        self
    }

    /// Set payload
    pub fn payload(mut self, data: &[u8]) -> Self {
        self.payload = data.to_vec();
        self
    }

    // A zero UDP checksum means "not computed"; transmit all ones instead.
    fn fix_zero(&self, sum: u16) -> u16 {
        if self.transport == Transport::Udp && sum == 0 {
            0xFFFF
        } else {
            sum
        }
    }

    fn segment(&self) -> Vec<u8> {
        let mut seg = BytesMut::new();
        match self.transport {
            Transport::Tcp => {
                seg.put_u16(self.src_port);
                seg.put_u16(self.dst_port);
                seg.put_u32(self.seq);
                seg.put_u32(self.ack);
                seg.put_u8(0x50); // Data Offset (5 * 4 = 20 bytes)
                seg.put_u8(self.tcp_flags.to_byte());
                seg.put_u16(self.window);
                seg.put_u16(0); // Checksum (placeholder)
                seg.put_u16(0); // Urgent Pointer
            }
            Transport::Udp => {
                seg.put_u16(self.src_port);
                seg.put_u16(self.dst_port);
                seg.put_u16((8 + self.payload.len()) as u16);
                seg.put_u16(0); // Checksum (placeholder)
            }
        }
        seg.extend_from_slice(&self.payload);
        seg.to_vec()
    }

    /// Build the frame
    ///
    /// Addresses of the wrong family for the builder's IP version are
    /// replaced by the unspecified address.
    pub fn build(self) -> Vec<u8> {
        let protocol = match self.transport {
            Transport::Tcp => PROTO_TCP,
            Transport::Udp => PROTO_UDP,
        };
        let checksum_at = match self.transport {
            Transport::Tcp => 16,
            Transport::Udp => 6,
        };
        let mut segment = self.segment();

        let mut frame = BytesMut::with_capacity(ETHERNET_HEADER_LEN + IPV6_HEADER_LEN + segment.len());
        frame.extend_from_slice(&self.dst_mac.octets());
        frame.extend_from_slice(&self.src_mac.octets());

        match self.ip_version {
            IpVersion::V4 => {
                let src = as_v4(self.src_ip);
                let dst = as_v4(self.dst_ip);
                let sum = self.fix_zero(checksum::transport_checksum_v4(src, dst, protocol, &segment));
                segment[checksum_at..checksum_at + 2].copy_from_slice(&sum.to_be_bytes());

                let total_len = (IPV4_HEADER_LEN + segment.len()) as u16;
                let mut header = BytesMut::with_capacity(IPV4_HEADER_LEN);
                header.put_u8(0x45); // Version (4) + IHL (5)
                header.put_u8(0x00); // DSCP + ECN
                header.put_u16(total_len);
                header.put_u16(self.identification);
                header.put_u16(0x4000); // Flags (DF) + Fragment Offset
                header.put_u8(self.ttl);
                header.put_u8(protocol);
                header.put_u16(0); // Header Checksum (placeholder)
                header.extend_from_slice(&src.octets());
                header.extend_from_slice(&dst.octets());
                let sum = checksum::internet_checksum(&header);
                header[10..12].copy_from_slice(&sum.to_be_bytes());

                frame.put_u16(0x0800);
                frame.extend_from_slice(&header);
            }
            IpVersion::V6 => {
                let src = as_v6(self.src_ip);
                let dst = as_v6(self.dst_ip);
                let sum = self.fix_zero(checksum::transport_checksum_v6(src, dst, protocol, &segment));
                segment[checksum_at..checksum_at + 2].copy_from_slice(&sum.to_be_bytes());

                frame.put_u16(0x86DD);
                frame.put_u32((6 << 28) | self.flow_label);
                frame.put_u16(segment.len() as u16);
                frame.put_u8(protocol);
                frame.put_u8(self.ttl);
                frame.extend_from_slice(&src.octets());
                frame.extend_from_slice(&dst.octets());
            }
        }

        frame.extend_from_slice(&segment);
        frame.to_vec()
    }
}

fn as_v4(addr: IpAddr) -> Ipv4Addr {
    match addr {
        IpAddr::V4(a) => a,
        IpAddr::V6(_) => Ipv4Addr::UNSPECIFIED,
    }
}

fn as_v6(addr: IpAddr) -> Ipv6Addr {
    match addr {
        IpAddr::V6(a) => a,
        IpAddr::V4(_) => Ipv6Addr::UNSPECIFIED,
    }
}
