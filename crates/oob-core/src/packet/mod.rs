//! Frame decoding
//!
//! Turns a raw Ethernet frame into a [`DecodedView`]: link addresses, the
//! network-layer identity and, for TCP, the header fields the reset
//! synthesizer needs. Decoding never fails outright; a layer that cannot be
//! parsed simply ends the walk and is reported through [`Layers`].

mod builder;
pub mod checksum;
mod types;

pub use builder::FrameBuilder;
pub use types::*;

use crate::error::{Error, Result};
use pnet::util::MacAddr;
use pnet_packet::ethernet::{EtherType, EtherTypes, EthernetPacket};
use pnet_packet::ip::IpNextHeaderProtocols;
use pnet_packet::ipv4::Ipv4Packet;
use pnet_packet::ipv6::Ipv6Packet;
use pnet_packet::tcp::TcpPacket;
use pnet_packet::udp::UdpPacket;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::ops::Range;
use tracing::trace;

/// Ethernet II header length
pub const ETHERNET_HEADER_LEN: usize = 14;

/// Fixed IPv4 header length (no options)
pub const IPV4_HEADER_LEN: usize = 20;

/// Fixed IPv6 header length
pub const IPV6_HEADER_LEN: usize = 40;

/// TCP header length without options
pub const TCP_HEADER_LEN: usize = 20;

/// UDP header length
pub const UDP_HEADER_LEN: usize = 8;

const IPV4_MORE_FRAGMENTS: u8 = 0b001;

/// Network-layer identity of a decoded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkLayer {
    /// IPv4 header fields
    V4 {
        /// Source address
        src: Ipv4Addr,
        /// Destination address
        dst: Ipv4Addr,
        /// Time to live
        ttl: u8,
        /// Identification field
        identification: u16,
    },
    /// IPv6 header fields
    V6 {
        /// Source address
        src: Ipv6Addr,
        /// Destination address
        dst: Ipv6Addr,
        /// Hop limit
        hop_limit: u8,
        /// Flow label (20 bits)
        flow_label: u32,
    },
}

impl NetworkLayer {
    /// IP version of this layer
    pub fn version(&self) -> IpVersion {
        match self {
            NetworkLayer::V4 { .. } => IpVersion::V4,
            NetworkLayer::V6 { .. } => IpVersion::V6,
        }
    }

    /// Source address
    pub fn source(&self) -> IpAddr {
        match *self {
            NetworkLayer::V4 { src, .. } => IpAddr::V4(src),
            NetworkLayer::V6 { src, .. } => IpAddr::V6(src),
        }
    }

    /// Destination address
    pub fn destination(&self) -> IpAddr {
        match *self {
            NetworkLayer::V4 { dst, .. } => IpAddr::V4(dst),
            NetworkLayer::V6 { dst, .. } => IpAddr::V6(dst),
        }
    }

    /// TTL or hop limit
    pub fn ttl(&self) -> u8 {
        match *self {
            NetworkLayer::V4 { ttl, .. } => ttl,
            NetworkLayer::V6 { hop_limit, .. } => hop_limit,
        }
    }
}

/// TCP header fields of a decoded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpHeader {
    /// Source port
    pub src_port: u16,
    /// Destination port
    pub dst_port: u16,
    /// Sequence number
    pub sequence: u32,
    /// Acknowledgment number
    pub acknowledgement: u32,
    /// Receive window
    pub window: u16,
    /// Control flags
    pub flags: TcpFlags,
    /// Length of the segment payload
    pub payload_len: usize,
}

impl TcpHeader {
    /// Sequence number the sender's next segment would carry
    pub fn next_sequence(&self) -> u32 {
        // Segment payloads are bounded by the 16-bit IP length fields.
        self.sequence.wrapping_add(self.payload_len as u32)
    }
}

/// UDP header fields of a decoded frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UdpHeader {
    /// Source port
    pub src_port: u16,
    /// Destination port
    pub dst_port: u16,
}

/// Typed fields extracted from one frame
///
/// Owned by a [`LayerDecoder`] and overwritten on every decode. Payload bytes
/// are not copied; [`DecodedView::payload`] slices them out of the frame the
/// view was decoded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedView {
    /// Layers that were recognized
    pub layers: Layers,
    /// Link-layer source address
    pub src_mac: MacAddr,
    /// Link-layer destination address
    pub dst_mac: MacAddr,
    /// Ethertype of the link layer
    pub ethertype: u16,
    /// IPv4 or IPv6 identity
    pub network: Option<NetworkLayer>,
    /// TCP header, if TCP was recognized
    pub tcp: Option<TcpHeader>,
    /// UDP header, if UDP was recognized
    pub udp: Option<UdpHeader>,
    network_range: Range<usize>,
    payload_range: Range<usize>,
}

impl Default for DecodedView {
    fn default() -> Self {
        Self {
            layers: Layers::empty(),
            src_mac: MacAddr::zero(),
            dst_mac: MacAddr::zero(),
            ethertype: 0,
            network: None,
            tcp: None,
            udp: None,
            network_range: 0..0,
            payload_range: 0..0,
        }
    }
}

impl DecodedView {
    /// Check if a TCP layer was recognized
    pub fn is_tcp(&self) -> bool {
        self.layers.contains(Layers::TCP)
    }

    /// Check if a UDP layer was recognized
    pub fn is_udp(&self) -> bool {
        self.layers.contains(Layers::UDP)
    }

    /// Source and destination address, if a network layer was recognized
    pub fn addresses(&self) -> Option<(IpAddr, IpAddr)> {
        self.network.map(|n| (n.source(), n.destination()))
    }

    /// Payload handed to handlers
    ///
    /// The transport payload for TCP and UDP, the IP payload otherwise.
    /// `frame` must be the buffer this view was decoded from.
    pub fn payload<'a>(&self, frame: &'a [u8]) -> &'a [u8] {
        frame.get(self.payload_range.clone()).unwrap_or(&[])
    }

    /// Verify IP header and transport checksums
    ///
    /// Returns `None` when there is nothing to verify (no TCP/UDP layer).
    pub fn checksums_valid(&self, frame: &[u8]) -> Option<bool> {
        let network = self.network?;
        let ip = frame.get(self.network_range.clone())?;
        let protocol = if self.is_tcp() {
            IpNextHeaderProtocols::Tcp.0
        } else if self.is_udp() {
            IpNextHeaderProtocols::Udp.0
        } else {
            return None;
        };

        match network {
            NetworkLayer::V4 { src, dst, .. } => {
                let header_len = usize::from(ip[0] & 0x0F) * 4;
                let header_ok = checksum::ipv4_header_valid(&ip[..header_len]);
                let segment = &ip[header_len..];
                Some(header_ok && checksum::transport_checksum_v4(src, dst, protocol, segment) == 0)
            }
            NetworkLayer::V6 { src, dst, .. } => {
                let segment = &ip[IPV6_HEADER_LEN..];
                Some(checksum::transport_checksum_v6(src, dst, protocol, segment) == 0)
            }
        }
    }
}

/// Reusable Ethernet / IP / TCP / UDP decoder
///
/// Each worker owns one; the view is reset before every frame.
#[derive(Debug, Default)]
pub struct LayerDecoder {
    view: DecodedView,
}

impl LayerDecoder {
    /// Create a decoder with an empty view
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a frame, returning the refreshed view
    ///
    /// Errors are swallowed: whatever was recognized before the failing
    /// layer stays in the view.
    pub fn decode(&mut self, frame: &[u8]) -> &DecodedView {
        self.view = DecodedView::default();
        if let Err(e) = decode_into(&mut self.view, frame) {
            trace!(error = %e, layers = ?self.view.layers, "Frame only partially decoded");
        }
        &self.view
    }

    /// The view produced by the last decode
    pub fn view(&self) -> &DecodedView {
        &self.view
    }
}

/// Decode a frame into a fresh view, reporting the first decode error
pub fn decode_frame(frame: &[u8]) -> Result<DecodedView> {
    let mut view = DecodedView::default();
    decode_into(&mut view, frame)?;
    Ok(view)
}

fn decode_into(view: &mut DecodedView, frame: &[u8]) -> Result<()> {
    let eth = EthernetPacket::new(frame).ok_or(Error::PacketTooSmall {
        expected: ETHERNET_HEADER_LEN,
        actual: frame.len(),
    })?;
    view.layers |= Layers::ETHERNET;
    view.src_mac = eth.get_source();
    view.dst_mac = eth.get_destination();
    let ethertype: EtherType = eth.get_ethertype();
    view.ethertype = ethertype.0;

    let ip = &frame[ETHERNET_HEADER_LEN..];
    let (transport, protocol) = match ethertype {
        EtherTypes::Ipv4 => decode_ipv4(view, ip)?,
        EtherTypes::Ipv6 => decode_ipv6(view, ip)?,
        other => {
            return Err(Error::packet_parse_at(
                format!("Unsupported ethertype: {:#06x}", other.0),
                12,
            ))
        }
    };
    let Some(transport) = transport else {
        return Ok(());
    };

    let base = ETHERNET_HEADER_LEN + transport.start;
    let segment = &ip[transport];
    match protocol {
        p if p == IpNextHeaderProtocols::Tcp.0 => decode_tcp(view, segment, base),
        p if p == IpNextHeaderProtocols::Udp.0 => decode_udp(view, segment, base),
        _ => Ok(()),
    }
}

/// Returns the transport range (relative to `ip`) when the transport layer
/// should be decoded, plus the protocol number.
fn decode_ipv4(view: &mut DecodedView, ip: &[u8]) -> Result<(Option<Range<usize>>, u8)> {
    let packet = Ipv4Packet::new(ip).ok_or(Error::PacketTooSmall {
        expected: IPV4_HEADER_LEN,
        actual: ip.len(),
    })?;
    if packet.get_version() != 4 {
        return Err(Error::packet_parse_at("IPv4 version mismatch", ETHERNET_HEADER_LEN));
    }

    let header_len = usize::from(packet.get_header_length()) * 4;
    if header_len < IPV4_HEADER_LEN {
        return Err(Error::packet_parse_at(
            format!("Invalid IPv4 header length: {header_len}"),
            ETHERNET_HEADER_LEN,
        ));
    }

    // Zero total length comes from segmentation offload; trust the capture.
    let mut total_len = match usize::from(packet.get_total_length()) {
        0 => ip.len(),
        n => n,
    };
    if total_len < header_len {
        return Err(Error::packet_parse_at(
            format!("IPv4 total length {total_len} below header length {header_len}"),
            ETHERNET_HEADER_LEN + 2,
        ));
    }
    if ip.len() < header_len {
        return Err(Error::PacketTooSmall {
            expected: ETHERNET_HEADER_LEN + header_len,
            actual: ETHERNET_HEADER_LEN + ip.len(),
        });
    }
    // Link padding past the datagram is dropped; a truncated capture keeps what is there.
    total_len = total_len.min(ip.len());

    view.layers |= Layers::IPV4;
    view.network = Some(NetworkLayer::V4 {
        src: packet.get_source(),
        dst: packet.get_destination(),
        ttl: packet.get_ttl(),
        identification: packet.get_identification(),
    });
    view.network_range = ETHERNET_HEADER_LEN..ETHERNET_HEADER_LEN + total_len;
    view.payload_range = ETHERNET_HEADER_LEN + header_len..ETHERNET_HEADER_LEN + total_len;

    let fragmented = packet.get_flags() & IPV4_MORE_FRAGMENTS != 0 || packet.get_fragment_offset() != 0;
    if fragmented {
        return Ok((None, packet.get_next_level_protocol().0));
    }

    Ok((Some(header_len..total_len), packet.get_next_level_protocol().0))
}

fn decode_ipv6(view: &mut DecodedView, ip: &[u8]) -> Result<(Option<Range<usize>>, u8)> {
    let packet = Ipv6Packet::new(ip).ok_or(Error::PacketTooSmall {
        expected: IPV6_HEADER_LEN,
        actual: ip.len(),
    })?;
    if packet.get_version() != 6 {
        return Err(Error::packet_parse_at("IPv6 version mismatch", ETHERNET_HEADER_LEN));
    }

    let total_len = (IPV6_HEADER_LEN + usize::from(packet.get_payload_length())).min(ip.len());

    view.layers |= Layers::IPV6;
    view.network = Some(NetworkLayer::V6 {
        src: packet.get_source(),
        dst: packet.get_destination(),
        hop_limit: packet.get_hop_limit(),
        flow_label: packet.get_flow_label(),
    });
    view.network_range = ETHERNET_HEADER_LEN..ETHERNET_HEADER_LEN + total_len;
    view.payload_range = ETHERNET_HEADER_LEN + IPV6_HEADER_LEN..ETHERNET_HEADER_LEN + total_len;

    Ok((Some(IPV6_HEADER_LEN..total_len), packet.get_next_header().0))
}

fn decode_tcp(view: &mut DecodedView, segment: &[u8], base: usize) -> Result<()> {
    let tcp = TcpPacket::new(segment).ok_or(Error::PacketTooSmall {
        expected: base + TCP_HEADER_LEN,
        actual: base + segment.len(),
    })?;
    let header_len = usize::from(tcp.get_data_offset()) * 4;
    if header_len < TCP_HEADER_LEN || header_len > segment.len() {
        return Err(Error::packet_parse_at(
            format!("Invalid TCP data offset: {header_len}"),
            base + 12,
        ));
    }

    let payload_len = segment.len() - header_len;
    view.layers |= Layers::TCP;
    if payload_len > 0 {
        view.layers |= Layers::PAYLOAD;
    }
    view.tcp = Some(TcpHeader {
        src_port: tcp.get_source(),
        dst_port: tcp.get_destination(),
        sequence: tcp.get_sequence(),
        acknowledgement: tcp.get_acknowledgement(),
        window: tcp.get_window(),
        flags: TcpFlags::from_byte(tcp.get_flags() as u8),
        payload_len,
    });
    view.payload_range = base + header_len..base + segment.len();
    Ok(())
}

fn decode_udp(view: &mut DecodedView, segment: &[u8], base: usize) -> Result<()> {
    let udp = UdpPacket::new(segment).ok_or(Error::PacketTooSmall {
        expected: base + UDP_HEADER_LEN,
        actual: base + segment.len(),
    })?;

    let mut end = segment.len();
    let length = usize::from(udp.get_length());
    if (UDP_HEADER_LEN..end).contains(&length) {
        end = length;
    }

    view.layers |= Layers::UDP;
    if end > UDP_HEADER_LEN {
        view.layers |= Layers::PAYLOAD;
    }
    view.udp = Some(UdpHeader {
        src_port: udp.get_source(),
        dst_port: udp.get_destination(),
    });
    view.payload_range = base + UDP_HEADER_LEN..base + end;
    Ok(())
}
