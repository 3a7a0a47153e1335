//! UDP editor sink
//!
//! Forwards render commands to an editor plugin listening on a UDP port,
//! encoded per [`crate::wire`]. The socket is created by [`CommandSink::connect`]
//! and closed by [`CommandSink::disconnect`].

use crate::{encode_command, CommandSink, ConnectionState, SendContext, SinkError, SinkMetadata};
use async_trait::async_trait;
use network::{TransportError, UdpConfig, UdpTransport};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};
use types::RenderCommand;

/// Sends commands as datagrams to the editor
#[derive(Debug)]
pub struct UdpEditorSink {
    target: SocketAddr,
    send_timeout: Duration,
    transport: RwLock<Option<UdpTransport>>,
    connected: std::sync::atomic::AtomicBool,
    commands_sent: AtomicU64,
    commands_failed: AtomicU64,
}

impl UdpEditorSink {
    pub fn new(target: SocketAddr, send_timeout: Duration) -> Self {
        Self {
            target,
            send_timeout,
            transport: RwLock::new(None),
            connected: std::sync::atomic::AtomicBool::new(false),
            commands_sent: AtomicU64::new(0),
            commands_failed: AtomicU64::new(0),
        }
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    fn fail(&self, command: &RenderCommand, error: impl ToString) -> SinkError {
        self.commands_failed.fetch_add(1, Ordering::Relaxed);
        SinkError::send_failed(
            error.to_string(),
            SendContext::for_command(command).with_target(self.target.to_string()),
        )
    }
}

#[async_trait]
impl CommandSink for UdpEditorSink {
    async fn send(&self, command: RenderCommand) -> Result<(), SinkError> {
        let guard = self.transport.read().await;
        let Some(transport) = guard.as_ref() else {
            return Err(self.fail(&command, "not connected"));
        };

        let bytes = codec::encode(&encode_command(&command));
        match transport.send(&bytes).await {
            Ok(()) => {
                self.commands_sent.fetch_add(1, Ordering::Relaxed);
                debug!(%command, target = %self.target, "forwarded to editor");
                Ok(())
            }
            Err(TransportError::Timeout { timeout_ms, .. }) => {
                self.commands_failed.fetch_add(1, Ordering::Relaxed);
                Err(SinkError::Timeout(timeout_ms))
            }
            Err(e) => Err(self.fail(&command, e)),
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    async fn connect(&self) -> Result<(), SinkError> {
        let mut guard = self.transport.write().await;
        if guard.is_some() {
            return Ok(());
        }

        let transport = UdpTransport::new(UdpConfig::sender(self.target, self.send_timeout))
            .await
            .map_err(|e| SinkError::connection_failed(e.to_string()))?;
        *guard = Some(transport);
        self.connected.store(true, Ordering::Relaxed);
        info!("Editor sink forwarding to {}", self.target);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), SinkError> {
        self.transport.write().await.take();
        self.connected.store(false, Ordering::Relaxed);
        Ok(())
    }

    fn metadata(&self) -> SinkMetadata {
        SinkMetadata::new("editor", "udp")
            .with_endpoint(format!("udp://{}", self.target))
            .with_state(if self.is_connected() {
                ConnectionState::Connected
            } else {
                ConnectionState::Disconnected
            })
            .with_counts(
                self.commands_sent.load(Ordering::Relaxed),
                self.commands_failed.load(Ordering::Relaxed),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode_command;
    use network::UdpConfig;
    use std::net::Ipv4Addr;
    use types::{PositionRange, StreamKey};

    #[tokio::test]
    async fn test_commands_arrive_as_editor_messages() {
        let editor = UdpTransport::new(UdpConfig::listener(SocketAddr::from((
            Ipv4Addr::LOCALHOST,
            0,
        ))))
        .await
        .unwrap();
        let sink = UdpEditorSink::new(editor.local_addr().unwrap(), Duration::from_millis(200));

        let set = RenderCommand::Set {
            key: StreamKey(1),
            range: PositionRange::new(1, 5, 1, 10).unwrap(),
        };
        assert!(sink.send(set).await.is_err());

        sink.connect().await.unwrap();
        sink.send(set).await.unwrap();
        sink.send(RenderCommand::Clear { key: StreamKey(1) }).await.unwrap();

        let mut received = Vec::new();
        for _ in 0..2 {
            let (bytes, _) = editor
                .receive_from_timeout(Duration::from_secs(2))
                .await
                .unwrap();
            let msg = codec::decode(&bytes).unwrap();
            received.push(decode_command(&msg).unwrap());
        }
        assert_eq!(
            received,
            vec![set, RenderCommand::Clear { key: StreamKey(1) }]
        );

        let meta = sink.metadata();
        assert_eq!(meta.commands_sent, 2);
        assert_eq!(meta.commands_failed, 1);

        sink.disconnect().await.unwrap();
        assert!(!sink.is_connected());
    }
}
