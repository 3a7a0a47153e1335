//! Bridge-level errors
//!
//! Only startup can fail the bridge. Per-datagram problems are logged and
//! counted inside the ingress loop and never surface here.

use bridge_config::ConfigError;
use message_sink::SinkError;
use network::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Bind failure or another socket error at startup
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Editor sink error: {0}")]
    Sink(#[from] SinkError),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
