//! Event Ingress
//!
//! Owns the receiving socket. Each datagram is decoded, normalized and applied
//! on its own: nothing one datagram does can affect the next, and no datagram
//! can stop the loop.

use crate::error::Result;
use crate::normalizer::{NormalizeError, Normalizer};
use crate::stats::BridgeStats;
use crate::tracker::Tracker;
use bytes::Bytes;
use codec::decode_messages;
use network::{TransportError, UdpConfig, UdpTransport};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use types::RenderCommand;

#[derive(Debug)]
pub struct Ingress {
    transport: UdpTransport,
    normalizer: Normalizer,
    stats: Arc<BridgeStats>,
}

impl Ingress {
    /// Bind the ingress socket; failure here is fatal for the bridge
    pub async fn bind(
        address: SocketAddr,
        buffer_size: usize,
        normalizer: Normalizer,
        stats: Arc<BridgeStats>,
    ) -> Result<Self> {
        let mut config = UdpConfig::listener(address);
        config.buffer_size = buffer_size;
        let transport = UdpTransport::new(config).await?;

        info!(
            local = %transport.local_addr()?,
            address = normalizer.address(),
            "Listening for highlight events"
        );

        Ok(Self {
            transport,
            normalizer,
            stats,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.transport.local_addr()?)
    }

    /// Wait for the next datagram
    ///
    /// Cancel-safe, so it can sit in a `select!` next to timers. Datagrams cut
    /// short by the receive buffer are counted as undecodable and skipped.
    pub async fn recv(&self) -> network::Result<(Bytes, SocketAddr)> {
        loop {
            match self.transport.receive_from().await {
                Err(TransportError::Truncated { capacity, from }) => {
                    self.stats.record_datagram();
                    self.stats.record_codec_error();
                    warn!(%from, capacity, "Dropped datagram larger than the receive buffer");
                }
                received => return received,
            }
        }
    }

    /// Decode, normalize and apply one datagram
    pub fn process(
        &mut self,
        datagram: &[u8],
        from: SocketAddr,
        now: Instant,
        tracker: &mut Tracker,
    ) -> Vec<RenderCommand> {
        self.stats.record_datagram();

        let elements = match decode_messages(datagram) {
            Ok(elements) => elements,
            Err(e) => {
                self.stats.record_codec_error();
                warn!(%from, len = datagram.len(), "Dropped undecodable datagram: {}", e);
                return Vec::new();
            }
        };

        let mut commands = Vec::new();
        for element in elements {
            let message = match element {
                Ok(message) => message,
                Err(e) => {
                    self.stats.record_codec_error();
                    warn!(%from, "Dropped undecodable bundle element: {}", e);
                    continue;
                }
            };
            debug!(%from, %message, "Received");

            let event = match self.normalizer.normalize(&message, now) {
                Ok(event) => event,
                Err(e) => {
                    self.record_rejection(&e, from);
                    continue;
                }
            };

            self.stats.record_event_applied();
            commands.extend(tracker.apply(&event, now));
        }
        commands
    }

    fn record_rejection(&self, error: &NormalizeError, from: SocketAddr) {
        match error {
            NormalizeError::UnknownAddress { address } => {
                self.stats.record_unknown_address();
                debug!(%from, address, "Ignored message for another address");
            }
            NormalizeError::StreamKeyOutOfRange { .. } => {
                self.stats.record_rejected_key();
                warn!(%from, "Dropped event: {}", error);
            }
            _ => {
                self.stats.record_normalize_error();
                warn!(%from, "Dropped event: {}", error);
            }
        }
    }
}
