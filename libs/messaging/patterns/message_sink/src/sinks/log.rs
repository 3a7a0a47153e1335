//! Tracing-only sink for running without an editor attached

use crate::{CommandSink, ConnectionState, SinkError, SinkMetadata};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;
use types::RenderCommand;

#[derive(Debug, Default)]
pub struct LogSink {
    commands_sent: AtomicU64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommandSink for LogSink {
    async fn send(&self, command: RenderCommand) -> Result<(), SinkError> {
        self.commands_sent.fetch_add(1, Ordering::Relaxed);
        match command {
            RenderCommand::Set { key, range } => info!(stream = %key, %range, "highlight set"),
            RenderCommand::Clear { key } => info!(stream = %key, "highlight clear"),
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        true
    }

    async fn connect(&self) -> Result<(), SinkError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), SinkError> {
        Ok(())
    }

    fn metadata(&self) -> SinkMetadata {
        SinkMetadata::new("log", "log")
            .with_state(ConnectionState::Connected)
            .with_counts(self.commands_sent.load(Ordering::Relaxed), 0)
    }
}
