//! Internet checksum helpers
//!
//! Independent of the serializer so synthesized frames can be verified
//! against a second implementation.

use std::net::{Ipv4Addr, Ipv6Addr};

/// Fold a running one's-complement sum over `data`.
fn sum_words(mut sum: u32, data: &[u8]) -> u32 {
    let mut chunks = data.chunks_exact(2);
    for chunk in &mut chunks {
        sum += u32::from(u16::from_be_bytes([chunk[0], chunk[1]]));
    }

    // Handle odd byte
    if let [last] = chunks.remainder() {
        sum += u32::from(*last) << 8;
    }

    sum
}

fn fold(mut sum: u32) -> u16 {
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

/// Calculate Internet Checksum (RFC 1071)
pub fn internet_checksum(data: &[u8]) -> u16 {
    fold(sum_words(0, data))
}

/// Checksum of a transport segment under an IPv4 pseudo-header
pub fn transport_checksum_v4(src: Ipv4Addr, dst: Ipv4Addr, protocol: u8, segment: &[u8]) -> u16 {
    let mut sum = sum_words(0, &src.octets());
    sum = sum_words(sum, &dst.octets());
    sum += u32::from(protocol);
    sum += segment.len() as u32;
    fold(sum_words(sum, segment))
}

/// Checksum of a transport segment under an IPv6 pseudo-header
pub fn transport_checksum_v6(src: Ipv6Addr, dst: Ipv6Addr, protocol: u8, segment: &[u8]) -> u16 {
    let mut sum = sum_words(0, &src.octets());
    sum = sum_words(sum, &dst.octets());
    let len = segment.len() as u32;
    sum += len >> 16;
    sum += len & 0xFFFF;
    sum += u32::from(protocol);
    fold(sum_words(sum, segment))
}

/// Whether an IPv4 header (checksum field included) sums to zero
pub fn ipv4_header_valid(header: &[u8]) -> bool {
    header.len() >= 20 && internet_checksum(header) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internet_checksum_rfc1071() {
        // Example from RFC 1071
        let data = [0x00, 0x01, 0xf2, 0x03, 0xf4, 0xf5, 0xf6, 0xf7];
        assert_eq!(internet_checksum(&data), 0x220d);
    }

    #[test]
    fn test_internet_checksum_empty() {
        assert_eq!(internet_checksum(&[]), 0xFFFF);
    }

    #[test]
    fn test_internet_checksum_all_ones() {
        assert_eq!(internet_checksum(&[0xFF, 0xFF, 0xFF, 0xFF]), 0x0000);
    }

    #[test]
    fn test_ipv4_header_checksum() {
        let mut header = [
            0x45, 0x00, // Version, IHL, DSCP, ECN
            0x00, 0x3c, // Total length: 60
            0x1c, 0x46, // Identification
            0x40, 0x00, // Flags, Fragment offset
            0x40, 0x06, // TTL: 64, Protocol: TCP
            0x00, 0x00, // Checksum
            0xac, 0x10, 0x0a, 0x63, // Source IP: 172.16.10.99
            0xac, 0x10, 0x0a, 0x0c, // Dest IP: 172.16.10.12
        ];

        assert_eq!(internet_checksum(&header), 0xb1e6);
        assert!(!ipv4_header_valid(&header));

        header[10] = 0xb1;
        header[11] = 0xe6;
        assert!(ipv4_header_valid(&header));
    }

    #[test]
    fn test_transport_checksum_self_verifies() {
        let src = Ipv4Addr::new(192, 168, 1, 1);
        let dst = Ipv4Addr::new(192, 168, 1, 2);
        let mut segment = [
            0x30, 0x39, 0x00, 0x50, // ports 12345 -> 80
            0x00, 0x00, 0x00, 0x01, // seq
            0x00, 0x00, 0x00, 0x00, // ack
            0x50, 0x02, 0x72, 0x10, // offset, SYN, window
            0x00, 0x00, 0x00, 0x00, // checksum, urgent
        ];

        let sum = transport_checksum_v4(src, dst, 6, &segment);
        segment[16..18].copy_from_slice(&sum.to_be_bytes());
        assert_eq!(transport_checksum_v4(src, dst, 6, &segment), 0);
    }

    #[test]
    fn test_transport_checksum_v6_self_verifies() {
        let src: Ipv6Addr = "2001:db8::1".parse().unwrap();
        let dst: Ipv6Addr = "2001:db8::2".parse().unwrap();
        let mut segment = vec![0u8; 20];
        segment[0..2].copy_from_slice(&443u16.to_be_bytes());
        segment[2..4].copy_from_slice(&50000u16.to_be_bytes());
        segment[12] = 0x50;
        segment[13] = 0x04;
        segment.extend_from_slice(b"odd");

        let sum = transport_checksum_v6(src, dst, 6, &segment);
        segment[16..18].copy_from_slice(&sum.to_be_bytes());
        assert_eq!(transport_checksum_v6(src, dst, 6, &segment), 0);
    }
}
