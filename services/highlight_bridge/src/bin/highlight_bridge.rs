//! Highlight bridge service
//!
//! Usage:
//!   highlight_bridge
//!   highlight_bridge --config config/bridge.toml --debug
//!   highlight_bridge --port 7000 --editor-port 7001 --json-logs

use anyhow::{Context, Result};
use bridge_config::{BridgeConfig, EditorMode};
use clap::Parser;
use highlight_bridge::Bridge;
use message_sink::{CommandSink, LogSink, UdpEditorSink};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "highlight_bridge")]
#[command(about = "Bridge live coding highlight events to editor render commands")]
#[command(version)]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// UDP port to listen on for highlight events
    #[arg(short, long)]
    port: Option<u16>,

    /// Address pattern of highlight events
    #[arg(short, long)]
    address: Option<String>,

    /// Editor plugin UDP port
    #[arg(long)]
    editor_port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,
}

impl Args {
    fn apply(&self, config: &mut BridgeConfig) {
        if let Some(port) = self.port {
            config.ingress.port = port;
        }
        if let Some(address) = &self.address {
            config.ingress.address = address.clone();
        }
        if let Some(port) = self.editor_port {
            config.editor.port = port;
        }
        config.logging.debug |= self.debug;
        config.logging.json |= self.json_logs;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        BridgeConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);

    init_logging(&config);

    config.validate().context("Invalid configuration")?;

    info!("Starting highlight bridge");
    if let Some(path) = &args.config {
        info!("Configuration: {}", path.display());
    }

    let sink = build_sink(&config)?;
    let bridge = Bridge::bind(&config, sink).await.map_err(|e| {
        error!("Failed to start bridge: {}", e);
        e
    })?;

    info!("Listening on {}", bridge.local_addr()?);

    let stats = bridge.run(shutdown_signal()).await?;
    info!(
        delivered = stats.commands_delivered,
        dropped = stats.dropped(),
        "Highlight bridge stopped"
    );

    Ok(())
}

fn build_sink(config: &BridgeConfig) -> Result<Arc<dyn CommandSink>> {
    match config.editor.mode {
        EditorMode::Udp => {
            let target = config
                .editor
                .socket_addr()
                .context("Invalid editor address")?;
            info!("Forwarding render commands to editor at {}", target);
            Ok(Arc::new(UdpEditorSink::new(
                target,
                config.dispatcher.send_timeout(),
            )))
        }
        EditorMode::Log => {
            info!("Logging render commands only");
            Ok(Arc::new(LogSink::new()))
        }
    }
}

fn init_logging(config: &BridgeConfig) {
    let default_level = if config.logging.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
