//! Test harness that plays sample highlight traffic at a running bridge
//!
//! Usage:
//!   send_test_highlights
//!   send_test_highlights --target 127.0.0.1:7000 --delay-ms 200 --burst 40

use anyhow::{Context, Result};
use bridge_config::protocol::{DEFAULT_HIGHLIGHT_ADDRESS, DEFAULT_INGRESS_PORT};
use clap::Parser;
use codec::{encode, encode_packet, Bundle, Message, MessageBuilder, Packet, TimeTag};
use network::{UdpConfig, UdpTransport};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::sleep;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "send_test_highlights")]
#[command(about = "Send sample highlight events to a highlight bridge")]
#[command(version)]
struct Args {
    /// Bridge address
    #[arg(short, long, default_value_t = SocketAddr::from(([127, 0, 0, 1], DEFAULT_INGRESS_PORT)))]
    target: SocketAddr,

    /// Address pattern to send on
    #[arg(short, long, default_value = DEFAULT_HIGHLIGHT_ADDRESS)]
    address: String,

    /// Pause between sample cases
    #[arg(long, default_value_t = 1000)]
    delay_ms: u64,

    /// Number of rapid events in the final burst
    #[arg(long, default_value_t = 10)]
    burst: u32,
}

/// `[stream_id, start_row, start_col, end_row, end_col]` plus integer milliseconds
const MILLISECOND_CASES: [(i32, i32, i32, i32, i32, i32); 4] = [
    (1, 1, 5, 1, 10, 500),
    (2, 2, 0, 2, 15, 750),
    (1, 3, 8, 3, 12, 400),
    (3, 4, 3, 4, 20, 600),
];

/// Same layout with float seconds
const SECOND_CASES: [(i32, i32, i32, i32, i32, f32); 3] = [
    (1, 1, 5, 1, 15, 0.5),
    (2, 2, 10, 2, 20, 0.8),
    (3, 3, 0, 3, 30, 1.0),
];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let delay = Duration::from_millis(args.delay_ms);

    let transport = UdpTransport::new(UdpConfig::sender(args.target, Duration::from_millis(100)))
        .await
        .with_context(|| format!("Failed to open socket towards {}", args.target))?;

    info!("Sending test highlights to {}", args.target);

    for (i, &(id, sr, sc, er, ec, ms)) in MILLISECOND_CASES.iter().enumerate() {
        let message = MessageBuilder::new(&args.address)
            .int(id)
            .int(sr)
            .int(sc)
            .int(er)
            .int(ec)
            .int(ms)
            .build()?;
        send(&transport, &message).await?;
        info!("Sent ms case {}: stream={} pos=({},{})-({},{}) dur={}ms", i + 1, id, sr, sc, er, ec, ms);
        sleep(delay).await;
    }

    for (i, &(id, sr, sc, er, ec, secs)) in SECOND_CASES.iter().enumerate() {
        let message = MessageBuilder::new(&args.address)
            .int(id)
            .int(sr)
            .int(sc)
            .int(er)
            .int(ec)
            .float(secs)
            .build()?;
        send(&transport, &message).await?;
        info!("Sent seconds case {}: stream={} pos=({},{})-({},{}) dur={}s", i + 1, id, sr, sc, er, ec, secs);
        sleep(delay).await;
    }

    let tidal = MessageBuilder::new(&args.address)
        .string("bd")
        .float(0.5625)
        .float(1.0)
        .int(0)
        .float(0.5)
        .int(5)
        .int(15)
        .build()?;
    send(&transport, &tidal).await?;
    info!("Sent Tidal event: orbit=0 cols 5..15 delta=0.5s");
    sleep(delay).await;

    // Two streams in one bundle
    let bundle = Packet::Bundle(Bundle {
        time_tag: TimeTag::IMMEDIATE,
        content: vec![
            Packet::Message(highlight(&args.address, 4, 6, 0, 12, 300)?),
            Packet::Message(highlight(&args.address, 5, 7, 2, 9, 300)?),
        ],
    });
    transport.send(&encode_packet(&bundle)).await?;
    info!("Sent bundle with streams 4 and 5");
    sleep(delay).await;

    info!("High-frequency burst of {} events", args.burst);
    for i in 0..args.burst {
        let stream = (i % 4) as i32 + 1;
        let col = (i % 16) as i32 * 5;
        let message = highlight(&args.address, stream, 1, col, col + 4, 200)?;
        send(&transport, &message).await?;
        sleep(Duration::from_millis(5)).await;
    }

    info!("Test complete");
    Ok(())
}

fn highlight(address: &str, stream: i32, row: i32, start: i32, end: i32, ms: i32) -> Result<Message> {
    Ok(MessageBuilder::new(address)
        .int(stream)
        .int(row)
        .int(start)
        .int(row)
        .int(end)
        .int(ms)
        .build()?)
}

async fn send(transport: &UdpTransport, message: &Message) -> Result<()> {
    transport
        .send(&encode(message))
        .await
        .with_context(|| format!("Failed to send {}", message))
}
