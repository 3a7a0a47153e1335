//! # Editor Command Sinks
//!
//! The editor that paints highlights is an external collaborator. Everything
//! the bridge knows about it is the [`CommandSink`] trait: a destination that
//! accepts [`RenderCommand::Set`] and [`RenderCommand::Clear`] and nothing else.
//!
//! Provided sinks:
//! - [`UdpEditorSink`]: encodes commands with the packet codec and sends them to
//!   an editor plugin's UDP port
//! - [`LogSink`]: writes commands to the tracing log, for running headless
//! - [`test_utils`]: in-memory sinks for tests

pub mod error;
pub mod metadata;
pub mod sinks;
pub mod test_utils;
pub mod wire;

use async_trait::async_trait;
use std::fmt::Debug;

pub use error::{SendContext, SinkError};
pub use metadata::{ConnectionState, SinkMetadata};
pub use sinks::{LogSink, UdpEditorSink};
pub use types::RenderCommand;
pub use wire::{decode_command, encode_command, CLEAR_ADDRESS, SET_ADDRESS};

/// A destination for render commands that abstracts away the editor transport
#[async_trait]
pub trait CommandSink: Send + Sync + Debug {
    /// Deliver a single command
    async fn send(&self, command: RenderCommand) -> Result<(), SinkError>;

    /// Check if currently connected
    fn is_connected(&self) -> bool;

    /// Establish connection (may be no-op if already connected)
    async fn connect(&self) -> Result<(), SinkError>;

    /// Close connection (may be no-op if not connected)
    async fn disconnect(&self) -> Result<(), SinkError>;

    /// Get sink metadata for debugging/monitoring
    fn metadata(&self) -> SinkMetadata {
        SinkMetadata::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{CollectorSink, FailingSink};
    use types::{PositionRange, StreamKey};

    fn set(key: u32) -> RenderCommand {
        RenderCommand::Set {
            key: StreamKey(key),
            range: PositionRange::on_row(0, 1, 2).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_send_requires_connection() {
        let sink = CollectorSink::new();

        let result = sink.send(set(1)).await;
        assert!(matches!(result, Err(SinkError::SendFailed { .. })));

        sink.connect().await.unwrap();
        assert!(sink.send(set(1)).await.is_ok());
        assert_eq!(sink.command_count(), 1);
    }

    #[tokio::test]
    async fn test_sends_preserve_order() {
        let sink = CollectorSink::connected();

        let commands = vec![set(1), RenderCommand::Clear { key: StreamKey(1) }, set(2)];
        for command in &commands {
            sink.send(*command).await.unwrap();
        }
        assert_eq!(sink.received_commands(), commands);
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let sink = CollectorSink::connected();
        sink.fail_next_send();

        assert!(sink.send(set(1)).await.is_err());
        assert!(sink.send(set(2)).await.is_ok());
        assert_eq!(sink.received_commands(), vec![set(2)]);
    }

    #[tokio::test]
    async fn test_failing_sink() {
        let sink = FailingSink::default();
        assert!(sink.connect().await.is_err());
        assert!(!sink.is_connected());
        assert!(sink.send(set(3)).await.is_err());
    }
}
