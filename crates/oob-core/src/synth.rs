//! Spoofed TCP reset synthesis
//!
//! Given the decoded view of a TCP frame, builds a reset segment that
//! continues the original sender's stream: same link and network addresses,
//! same ports, and a sequence number placed right after the observed
//! payload so the receiver accepts it as in-window.

use crate::error::{Error, Result};
use crate::packet::{DecodedView, NetworkLayer, TcpFlags, TcpHeader};
use crate::packet::{ETHERNET_HEADER_LEN, IPV4_HEADER_LEN, IPV6_HEADER_LEN, TCP_HEADER_LEN};
use bytes::Bytes;
use pnet_packet::ethernet::{EtherTypes, MutableEthernetPacket};
use pnet_packet::ip::IpNextHeaderProtocols;
use pnet_packet::ipv4::{self, MutableIpv4Packet};
use pnet_packet::ipv6::MutableIpv6Packet;
use pnet_packet::tcp::{self, MutableTcpPacket};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Serialization options for synthesized frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthConfig {
    /// Fill in IP length fields
    pub fix_lengths: bool,
    /// Compute IPv4 header and TCP checksums
    pub compute_checksums: bool,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            fix_lengths: true,
            compute_checksums: true,
        }
    }
}

/// Builds spoofed RST frames
#[derive(Debug, Clone, Default)]
pub struct RstSynthesizer {
    config: SynthConfig,
}

impl RstSynthesizer {
    /// Create a synthesizer with the given options
    pub fn new(config: SynthConfig) -> Self {
        Self { config }
    }

    /// Options in use
    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    /// Build the reset frame for a decoded TCP frame
    pub fn synthesize(&self, view: &DecodedView) -> Result<Bytes> {
        let network = view
            .network
            .ok_or_else(|| Error::synthesis("no IPv4/IPv6 layer in triggering frame"))?;
        let tcp = view
            .tcp
            .ok_or_else(|| Error::synthesis("no TCP layer in triggering frame"))?;

        let ip_len = match network {
            NetworkLayer::V4 { .. } => IPV4_HEADER_LEN,
            NetworkLayer::V6 { .. } => IPV6_HEADER_LEN,
        };
        let mut buf = vec![0u8; ETHERNET_HEADER_LEN + ip_len + TCP_HEADER_LEN];
        let (eth_buf, rest) = buf.split_at_mut(ETHERNET_HEADER_LEN);
        let (ip_buf, tcp_buf) = rest.split_at_mut(ip_len);

        {
            let mut eth = MutableEthernetPacket::new(eth_buf)
                .ok_or_else(|| Error::synthesis("ethernet buffer too small"))?;
            eth.set_source(view.src_mac);
            eth.set_destination(view.dst_mac);
            eth.set_ethertype(match network {
                NetworkLayer::V4 { .. } => EtherTypes::Ipv4,
                NetworkLayer::V6 { .. } => EtherTypes::Ipv6,
            });
        }

        match network {
            NetworkLayer::V4 { src, dst, ttl, identification } => {
                self.write_tcp(tcp_buf, &tcp, |seg| tcp::ipv4_checksum(seg, &src, &dst))?;
                self.write_ipv4(ip_buf, src, dst, ttl, identification.wrapping_add(1))?;
            }
            NetworkLayer::V6 { src, dst, hop_limit, flow_label } => {
                self.write_tcp(tcp_buf, &tcp, |seg| tcp::ipv6_checksum(seg, &src, &dst))?;
                self.write_ipv6(ip_buf, src, dst, hop_limit, flow_label)?;
            }
        }

        Ok(Bytes::from(buf))
    }

    fn write_tcp<F>(&self, buf: &mut [u8], original: &TcpHeader, checksum: F) -> Result<()>
    where
        F: FnOnce(&tcp::TcpPacket<'_>) -> u16,
    {
        let mut seg = MutableTcpPacket::new(buf).ok_or_else(|| Error::synthesis("TCP buffer too small"))?;
        seg.set_source(original.src_port);
        seg.set_destination(original.dst_port);
        seg.set_sequence(original.next_sequence());
        seg.set_acknowledgement(original.acknowledgement);
        seg.set_data_offset((TCP_HEADER_LEN / 4) as u8);
        seg.set_flags(TcpFlags::RST_ONLY.to_byte().into());
        seg.set_window(original.window);
        seg.set_urgent_ptr(0);
        if self.config.compute_checksums {
            let sum = checksum(&seg.to_immutable());
            seg.set_checksum(sum);
        }
        Ok(())
    }

    fn write_ipv4(&self, buf: &mut [u8], src: Ipv4Addr, dst: Ipv4Addr, ttl: u8, id: u16) -> Result<()> {
        let mut ip = MutableIpv4Packet::new(buf).ok_or_else(|| Error::synthesis("IPv4 buffer too small"))?;
        ip.set_version(4);
        ip.set_header_length((IPV4_HEADER_LEN / 4) as u8);
        if self.config.fix_lengths {
            ip.set_total_length((IPV4_HEADER_LEN + TCP_HEADER_LEN) as u16);
        }
        ip.set_identification(id);
        ip.set_ttl(ttl);
        ip.set_next_level_protocol(IpNextHeaderProtocols::Tcp);
        ip.set_source(src);
        ip.set_destination(dst);
        if self.config.compute_checksums {
            let sum = ipv4::checksum(&ip.to_immutable());
            ip.set_checksum(sum);
        }
        Ok(())
    }

    fn write_ipv6(&self, buf: &mut [u8], src: Ipv6Addr, dst: Ipv6Addr, hop_limit: u8, flow_label: u32) -> Result<()> {
        let mut ip = MutableIpv6Packet::new(buf).ok_or_else(|| Error::synthesis("IPv6 buffer too small"))?;
        ip.set_version(6);
        ip.set_flow_label(flow_label & 0x000F_FFFF);
        if self.config.fix_lengths {
            ip.set_payload_length(TCP_HEADER_LEN as u16);
        }
        ip.set_next_header(IpNextHeaderProtocols::Tcp);
        ip.set_hop_limit(hop_limit);
        ip.set_source(src);
        ip.set_destination(dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{decode_frame, FrameBuilder, Layers};

    fn trigger_v4(seq: u32, payload: &[u8]) -> Vec<u8> {
        FrameBuilder::tcp_v4()
            .src_ip_v4([10, 1, 1, 2])
            .dst_ip_v4([93, 184, 216, 34])
            .src_port(40000)
            .dst_port(80)
            .ttl(61)
            .identification(0x1234)
            .seq(seq)
            .ack(0xCAFEBABE)
            .window(502)
            .payload(payload)
            .build()
    }

    #[test]
    fn test_rst_v4_fields() {
        let frame = trigger_v4(7_000, b"hello world");
        let view = decode_frame(&frame).unwrap();
        let rst = RstSynthesizer::default().synthesize(&view).unwrap();

        let out = decode_frame(&rst).unwrap();
        assert!(out.layers.contains(Layers::IPV4 | Layers::TCP));
        assert!(!out.layers.contains(Layers::PAYLOAD));
        assert_eq!(out.src_mac, view.src_mac);
        assert_eq!(out.dst_mac, view.dst_mac);
        assert_eq!(out.addresses(), view.addresses());

        let tcp = out.tcp.unwrap();
        assert_eq!(tcp.sequence, 7_011);
        assert_eq!(tcp.acknowledgement, 0xCAFEBABE);
        assert_eq!(tcp.window, 502);
        assert_eq!(tcp.flags, TcpFlags::RST_ONLY);
        assert_eq!((tcp.src_port, tcp.dst_port), (40000, 80));

        match out.network.unwrap() {
            NetworkLayer::V4 { ttl, identification, .. } => {
                assert_eq!(ttl, 61);
                assert_eq!(identification, 0x1235);
            }
            other => panic!("unexpected network layer {other:?}"),
        }
        assert_eq!(out.checksums_valid(&rst), Some(true));
    }

    #[test]
    fn test_identification_wraps() {
        let frame = FrameBuilder::tcp_v4().identification(u16::MAX).build();
        let view = decode_frame(&frame).unwrap();
        let rst = RstSynthesizer::default().synthesize(&view).unwrap();
        match decode_frame(&rst).unwrap().network.unwrap() {
            NetworkLayer::V4 { identification, .. } => assert_eq!(identification, 0),
            other => panic!("unexpected network layer {other:?}"),
        }
    }

    #[test]
    fn test_rst_v6_fields() {
        let frame = FrameBuilder::tcp_v6()
            .src_ip_v6("2001:db8::10".parse().unwrap())
            .dst_ip_v6("2001:db8::20".parse().unwrap())
            .src_port(50123)
            .dst_port(443)
            .hop_limit(55)
            .flow_label(0x12345)
            .seq(u32::MAX - 2)
            .ack(99)
            .payload(b"abcdef")
            .build();
        let view = decode_frame(&frame).unwrap();
        let rst = RstSynthesizer::default().synthesize(&view).unwrap();

        assert_eq!(rst.len(), ETHERNET_HEADER_LEN + IPV6_HEADER_LEN + TCP_HEADER_LEN);
        let out = decode_frame(&rst).unwrap();
        assert!(out.layers.contains(Layers::IPV6 | Layers::TCP));
        assert_eq!(out.tcp.unwrap().sequence, 3);
        assert_eq!(out.tcp.unwrap().acknowledgement, 99);
        assert_eq!(
            out.network.unwrap(),
            NetworkLayer::V6 {
                src: "2001:db8::10".parse().unwrap(),
                dst: "2001:db8::20".parse().unwrap(),
                hop_limit: 55,
                flow_label: 0x12345,
            }
        );
        assert_eq!(out.checksums_valid(&rst), Some(true));
    }

    #[test]
    fn test_no_network_layer_fails() {
        let view = DecodedView::default();
        let err = RstSynthesizer::default().synthesize(&view).unwrap_err();
        assert!(matches!(err, Error::Synthesis(_)));
    }

    #[test]
    fn test_udp_view_fails() {
        let frame = FrameBuilder::udp_v4().build();
        let view = decode_frame(&frame).unwrap();
        assert!(RstSynthesizer::default().synthesize(&view).is_err());
    }

    #[test]
    fn test_checksums_disabled() {
        let frame = trigger_v4(1, b"x");
        let view = decode_frame(&frame).unwrap();
        let synth = RstSynthesizer::new(SynthConfig {
            compute_checksums: false,
            ..Default::default()
        });
        let rst = synth.synthesize(&view).unwrap();
        // IPv4 checksum bytes stay zero
        assert_eq!(&rst[ETHERNET_HEADER_LEN + 10..ETHERNET_HEADER_LEN + 12], &[0, 0]);
        assert_eq!(decode_frame(&rst).unwrap().checksums_valid(&rst), Some(false));
    }
}
