//! Per-datagram ingress processing: decode, normalize, apply

use codec::{encode, encode_packet, Bundle, MessageBuilder, Packet, TimeTag};
use highlight_bridge::{BridgeStats, Ingress, Normalizer, RowStrategy, Tracker};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use types::{PositionRange, RenderCommand, StreamKey, StreamKeyRange};

const ADDRESS: &str = "/editor/highlights";

async fn ingress() -> (Ingress, Tracker, Arc<BridgeStats>) {
    ingress_with_buffer(4096).await
}

async fn ingress_with_buffer(buffer_size: usize) -> (Ingress, Tracker, Arc<BridgeStats>) {
    let keys = StreamKeyRange::default();
    let stats = Arc::new(BridgeStats::new());
    let ingress = Ingress::bind(
        "127.0.0.1:0".parse().unwrap(),
        buffer_size,
        Normalizer::new(ADDRESS, keys, RowStrategy::Fixed(0)),
        stats.clone(),
    )
    .await
    .unwrap();
    (ingress, Tracker::new(keys), stats)
}

fn peer() -> SocketAddr {
    "127.0.0.1:57120".parse().unwrap()
}

fn highlight(stream: i32, range: [i32; 4], ms: i32) -> Vec<u8> {
    MessageBuilder::new(ADDRESS)
        .int(stream)
        .int(range[0])
        .int(range[1])
        .int(range[2])
        .int(range[3])
        .int(ms)
        .encode()
        .unwrap()
}

fn set(key: u32, range: (u32, u32, u32, u32)) -> RenderCommand {
    RenderCommand::Set {
        key: StreamKey(key),
        range: PositionRange::new(range.0, range.1, range.2, range.3).unwrap(),
    }
}

/// Valid header followed by a type tag the codec does not support
fn unknown_tag_datagram() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"/editor/highlights\0\0");
    data.extend_from_slice(b",ih\0");
    data.extend_from_slice(&1i32.to_be_bytes());
    data.extend_from_slice(&[0u8; 8]);
    data
}

#[tokio::test]
async fn test_schema_a_produces_set() {
    let (mut ingress, mut tracker, stats) = ingress().await;
    let now = Instant::now();

    let commands = ingress.process(&highlight(1, [1, 5, 1, 10], 500), peer(), now, &mut tracker);
    assert_eq!(commands, vec![set(1, (1, 5, 1, 10))]);

    let active = tracker.active(StreamKey(1)).unwrap();
    assert_eq!(active.expires_at, now + Duration::from_millis(500));
    assert_eq!(stats.snapshot().events_applied, 1);
}

#[tokio::test]
async fn test_schema_b_produces_set() {
    let (mut ingress, mut tracker, _) = ingress().await;
    let datagram = MessageBuilder::new(ADDRESS)
        .string("bd")
        .float(0.5625)
        .float(1.0)
        .int(0)
        .float(0.5)
        .int(5)
        .int(15)
        .encode()
        .unwrap();

    let now = Instant::now();
    let commands = ingress.process(&datagram, peer(), now, &mut tracker);
    assert_eq!(commands, vec![set(0, (0, 5, 0, 15))]);
    assert_eq!(
        tracker.active(StreamKey(0)).unwrap().expires_at,
        now + Duration::from_millis(500)
    );
}

#[tokio::test]
async fn test_unknown_type_tag_then_valid() {
    let (mut ingress, mut tracker, stats) = ingress().await;
    let now = Instant::now();

    assert!(ingress
        .process(&unknown_tag_datagram(), peer(), now, &mut tracker)
        .is_empty());
    let commands = ingress.process(&highlight(2, [0, 0, 0, 3], 100), peer(), now, &mut tracker);
    assert_eq!(commands, vec![set(2, (0, 0, 0, 3))]);

    let snap = stats.snapshot();
    assert_eq!(snap.datagrams_received, 2);
    assert_eq!(snap.codec_errors, 1);
    assert_eq!(snap.events_applied, 1);
}

#[tokio::test]
async fn test_malformed_datagram_isolated() {
    let (mut ingress, mut tracker, stats) = ingress().await;
    let now = Instant::now();

    let first = ingress.process(&highlight(1, [1, 0, 1, 4], 300), peer(), now, &mut tracker);
    let garbage = ingress.process(&[0xff, 0x00, 0x13], peer(), now, &mut tracker);
    let third = ingress.process(&highlight(2, [2, 0, 2, 4], 300), peer(), now, &mut tracker);

    assert_eq!(first, vec![set(1, (1, 0, 1, 4))]);
    assert!(garbage.is_empty());
    assert_eq!(third, vec![set(2, (2, 0, 2, 4))]);
    assert_eq!(tracker.len(), 2);
    assert_eq!(stats.snapshot().codec_errors, 1);
}

#[tokio::test]
async fn test_rejections_are_counted() {
    let (mut ingress, mut tracker, stats) = ingress().await;
    let now = Instant::now();

    // Another address
    let other = MessageBuilder::new("/dirt/play").int(1).encode().unwrap();
    // Key outside 0..=15
    let out_of_range = highlight(40, [0, 0, 0, 1], 100);
    // Inverted range
    let inverted = highlight(1, [3, 0, 1, 0], 100);
    // Wrong argument count
    let short = MessageBuilder::new(ADDRESS).int(1).int(2).encode().unwrap();

    for datagram in [other, out_of_range, inverted, short] {
        assert!(ingress.process(&datagram, peer(), now, &mut tracker).is_empty());
    }

    let snap = stats.snapshot();
    assert_eq!(snap.unknown_address, 1);
    assert_eq!(snap.rejected_keys, 1);
    assert_eq!(snap.normalize_errors, 2);
    assert_eq!(snap.events_applied, 0);
    assert_eq!(snap.dropped(), 4);
    assert!(tracker.is_empty());
}

#[tokio::test]
async fn test_bundle_elements_processed_independently() {
    let (mut ingress, mut tracker, stats) = ingress().await;

    let message = |stream: i32, row: i32| {
        MessageBuilder::new(ADDRESS)
            .int(stream)
            .int(row)
            .int(0)
            .int(row)
            .int(4)
            .int(250)
            .build()
            .unwrap()
    };
    let bad = MessageBuilder::new(ADDRESS).string("oops").build().unwrap();

    let bundle = Packet::Bundle(Bundle {
        time_tag: TimeTag::IMMEDIATE,
        content: vec![
            Packet::Message(message(3, 1)),
            Packet::Message(bad),
            Packet::Bundle(Bundle {
                time_tag: TimeTag::IMMEDIATE,
                content: vec![Packet::Message(message(4, 2))],
            }),
        ],
    });

    let commands = ingress.process(&encode_packet(&bundle), peer(), Instant::now(), &mut tracker);
    assert_eq!(commands, vec![set(3, (1, 0, 1, 4)), set(4, (2, 0, 2, 4))]);

    let snap = stats.snapshot();
    assert_eq!(snap.datagrams_received, 1);
    assert_eq!(snap.normalize_errors, 1);
    assert_eq!(snap.events_applied, 2);
}

#[tokio::test]
async fn test_burst_tracks_latest_per_key() {
    let (mut ingress, mut tracker, _) = ingress().await;
    let start = Instant::now();

    for i in 0..10i32 {
        let at = start + Duration::from_millis(i as u64 * 5);
        let datagram = highlight(i % 4, [1, i * 5, 1, i * 5 + 4], 200);
        ingress.process(&datagram, peer(), at, &mut tracker);
    }

    assert_eq!(tracker.len(), 4);
    for key in 0..4u32 {
        let latest = (0..10u32).filter(|i| i % 4 == key).max().unwrap();
        assert_eq!(
            tracker.active(StreamKey(key)).unwrap().position_range,
            PositionRange::on_row(1, latest * 5, latest * 5 + 4).unwrap()
        );
    }
}

#[tokio::test]
async fn test_zero_duration_clears() {
    let (mut ingress, mut tracker, _) = ingress().await;
    let now = Instant::now();

    ingress.process(&highlight(5, [0, 0, 0, 2], 1_000), peer(), now, &mut tracker);
    let commands = ingress.process(&encode(
        &MessageBuilder::new(ADDRESS)
            .int(5)
            .int(0)
            .int(0)
            .int(0)
            .int(2)
            .float(0.0)
            .build()
            .unwrap(),
    ), peer(), now, &mut tracker);

    assert_eq!(commands, vec![RenderCommand::Clear { key: StreamKey(5) }]);
    assert!(tracker.is_empty());
}

#[tokio::test]
async fn test_undecodable_bundle_element_keeps_siblings() {
    let (mut ingress, mut tracker, stats) = ingress().await;

    let valid = highlight(3, [1, 0, 1, 4], 250);
    let mut unsupported = Vec::new();
    unsupported.extend_from_slice(b"/x\0\0,h\0\0");
    unsupported.extend_from_slice(&[0u8; 4]);

    let mut datagram = Vec::new();
    datagram.extend_from_slice(b"#bundle\0");
    datagram.extend_from_slice(&TimeTag::IMMEDIATE.as_u64().to_be_bytes());
    for element in [&valid, &unsupported] {
        datagram.extend_from_slice(&(element.len() as u32).to_be_bytes());
        datagram.extend_from_slice(element);
    }

    let commands = ingress.process(&datagram, peer(), Instant::now(), &mut tracker);
    assert_eq!(commands, vec![set(3, (1, 0, 1, 4))]);

    let snap = stats.snapshot();
    assert_eq!(snap.datagrams_received, 1);
    assert_eq!(snap.codec_errors, 1);
    assert_eq!(snap.events_applied, 1);
}

#[tokio::test]
async fn test_datagram_larger_than_buffer_is_counted_not_cut() {
    let single = highlight(1, [0, 0, 0, 4], 250);
    let bundle = Packet::Bundle(Bundle {
        time_tag: TimeTag::IMMEDIATE,
        content: vec![
            Packet::Message(codec::decode(&single).unwrap()),
            Packet::Message(codec::decode(&highlight(2, [1, 0, 1, 4], 250)).unwrap()),
        ],
    });
    let two_elements = encode_packet(&bundle);

    // Room for a one-element bundle only
    let buffer = 16 + 4 + single.len();
    assert!(two_elements.len() > buffer);
    let (mut ingress, mut tracker, stats) = ingress_with_buffer(buffer).await;
    let target = ingress.local_addr().unwrap();

    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket.send_to(&two_elements, target).await.unwrap();
    socket.send_to(&single, target).await.unwrap();

    // The oversized bundle is skipped; the next datagram comes through whole
    let (datagram, from) = tokio::time::timeout(Duration::from_secs(2), ingress.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(&datagram[..], &single[..]);

    let commands = ingress.process(&datagram, from, Instant::now(), &mut tracker);
    assert_eq!(commands, vec![set(1, (0, 0, 0, 4))]);
    assert!(tracker.active(StreamKey(2)).is_none());

    let snap = stats.snapshot();
    assert_eq!(snap.datagrams_received, 2);
    assert_eq!(snap.codec_errors, 1);
    assert_eq!(snap.events_applied, 1);
}
