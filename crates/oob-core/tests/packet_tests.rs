//! Decoder and synthesizer properties

use oob_core::packet::{FrameBuilder, Layers, LayerDecoder, TcpFlags};
use oob_core::{decode_frame, RstSynthesizer, SynthConfig};
use proptest::prelude::*;
use std::net::Ipv6Addr;

fn tcp_frame(v6: bool, seq: u32, ack: u32, ports: (u16, u16), payload: &[u8]) -> Vec<u8> {
    let builder = if v6 {
        FrameBuilder::tcp_v6()
            .src_ip_v6(Ipv6Addr::new(0xfd00, 0, 0, 0, 0, 0, 0, 1))
            .dst_ip_v6(Ipv6Addr::new(0xfd00, 0, 0, 0, 0, 0, 0, 2))
    } else {
        FrameBuilder::tcp_v4()
            .src_ip_v4([172, 16, 0, 1])
            .dst_ip_v4([172, 16, 0, 2])
    };
    builder
        .src_port(ports.0)
        .dst_port(ports.1)
        .seq(seq)
        .ack(ack)
        .payload(payload)
        .build()
}

proptest! {
    #[test]
    fn decoder_survives_arbitrary_bytes(frame in proptest::collection::vec(any::<u8>(), 0..1600)) {
        let mut decoder = LayerDecoder::new();
        let view = decoder.decode(&frame);
        let payload = view.payload(&frame);
        prop_assert!(payload.len() <= frame.len());
    }

    #[test]
    fn decoder_survives_corrupted_headers(
        index in 0usize..54,
        value in any::<u8>(),
        truncate in 0usize..120,
    ) {
        let mut frame = tcp_frame(false, 1, 2, (1234, 80), b"GET / HTTP/1.1\r\n\r\n");
        frame[index] = value;
        frame.truncate(truncate);

        let mut decoder = LayerDecoder::new();
        let view = decoder.decode(&frame);
        if view.is_tcp() {
            prop_assert!(view.layers.has_network());
        }
        let _ = view.checksums_valid(&frame);
    }

    #[test]
    fn reset_sequence_follows_payload(
        v6 in any::<bool>(),
        seq in any::<u32>(),
        ack in any::<u32>(),
        ports in (any::<u16>(), any::<u16>()),
        payload in proptest::collection::vec(any::<u8>(), 0..512),
    ) {
        let frame = tcp_frame(v6, seq, ack, ports, &payload);
        let view = decode_frame(&frame).unwrap();

        let rst = RstSynthesizer::new(SynthConfig::default()).synthesize(&view).unwrap();
        let decoded = decode_frame(&rst).unwrap();
        let tcp = decoded.tcp.unwrap();

        prop_assert_eq!(tcp.sequence, seq.wrapping_add(payload.len() as u32));
        prop_assert_eq!(tcp.acknowledgement, ack);
        prop_assert_eq!((tcp.src_port, tcp.dst_port), ports);
        prop_assert_eq!(tcp.flags, TcpFlags::RST_ONLY);
        prop_assert_eq!(decoded.addresses(), view.addresses());
        prop_assert_eq!(decoded.checksums_valid(&rst), Some(true));
    }
}

#[test]
fn test_decoder_reuse_resets_view() {
    let tcp = tcp_frame(false, 7, 8, (1, 2), b"abc");
    let udp = FrameBuilder::udp_v6().payload(b"xyz").build();

    let mut decoder = LayerDecoder::new();
    assert!(decoder.decode(&tcp).is_tcp());

    let view = decoder.decode(&udp);
    assert!(view.is_udp());
    assert!(view.tcp.is_none());
    assert!(view.layers.contains(Layers::IPV6));
    assert!(!view.layers.contains(Layers::IPV4));
    assert_eq!(view.payload(&udp), b"xyz");

    let view = decoder.decode(&[]);
    assert!(view.layers.is_empty());
    assert!(view.addresses().is_none());
}

#[test]
fn test_reset_without_checksums() {
    let frame = tcp_frame(false, 100, 200, (5555, 80), b"hello");
    let view = decode_frame(&frame).unwrap();

    let synth = RstSynthesizer::new(SynthConfig {
        compute_checksums: false,
        ..Default::default()
    });
    let rst = synth.synthesize(&view).unwrap();
    let decoded = decode_frame(&rst).unwrap();

    assert_eq!(decoded.tcp.unwrap().sequence, 105);
    assert_eq!(decoded.checksums_valid(&rst), Some(false));
}

#[test]
fn test_builder_frames_verify() {
    for frame in [
        tcp_frame(false, 1, 1, (1, 2), b"payload"),
        tcp_frame(true, 1, 1, (1, 2), b"payload"),
        FrameBuilder::udp_v4().payload(b"dns?").build(),
        FrameBuilder::udp_v6().payload(b"").build(),
    ] {
        let view = decode_frame(&frame).unwrap();
        assert_eq!(view.checksums_valid(&frame), Some(true), "{}", hex::encode(&frame));
    }
}
