//! Transport Error Types
//!
//! Errors raised while binding, sending on or receiving from a socket.

use std::net::SocketAddr;
use thiserror::Error;

/// Main transport error type
#[derive(Error, Debug)]
pub enum TransportError {
    /// Network connectivity errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Socket could not be bound
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Protocol-level framing errors
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// Datagram larger than the receive buffer; the OS discarded its tail
    #[error("Datagram from {from} exceeds the {capacity}-byte receive buffer")]
    Truncated { capacity: usize, from: SocketAddr },

    /// Transport timeout errors
    #[error("Timeout error: {operation} exceeded {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },
}

/// Result type alias for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;

impl TransportError {
    /// Create a network error with source
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::Configuration {
            message: message.into(),
            field: field.map(|s| s.to_string()),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Whether retrying the same operation may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }
}
