//! UDP Network Transport Implementation
//!
//! Datagram transport with one application message per datagram. Unlike the
//! stream transports there is no length prefix: the datagram boundary is the
//! message boundary.

use crate::{Result, TransportError, DEFAULT_UDP_BUFFER_SIZE, MAX_UDP_PAYLOAD};
use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{Mutex, RwLock};
use tokio::time::timeout;
use tracing::{debug, info};

/// UDP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UdpConfig {
    /// Local address to bind to
    pub bind_address: SocketAddr,
    /// Remote address for connected mode (optional)
    pub remote_address: Option<SocketAddr>,
    /// Buffer size for reading
    pub buffer_size: usize,
    /// Maximum message size
    pub max_message_size: usize,
    /// Send timeout
    pub send_timeout: Duration,
}

impl Default for UdpConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            remote_address: None,
            buffer_size: DEFAULT_UDP_BUFFER_SIZE,
            max_message_size: MAX_UDP_PAYLOAD,
            send_timeout: Duration::from_millis(100),
        }
    }
}

impl UdpConfig {
    /// Listening socket on `bind_address`
    pub fn listener(bind_address: SocketAddr) -> Self {
        Self {
            bind_address,
            ..Default::default()
        }
    }

    /// Ephemeral local socket connected to `remote`
    pub fn sender(remote: SocketAddr, send_timeout: Duration) -> Self {
        let bind_address = if remote.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((std::net::Ipv6Addr::UNSPECIFIED, 0))
        };
        Self {
            bind_address,
            remote_address: Some(remote),
            send_timeout,
            ..Default::default()
        }
    }
}

/// UDP transport statistics
#[derive(Debug, Clone, Default)]
pub struct UdpStats {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub errors: u64,
    pub last_activity: Option<Instant>,
}

/// UDP transport for datagram communication
#[derive(Debug)]
pub struct UdpTransport {
    config: UdpConfig,
    socket: Arc<UdpSocket>,
    stats: Arc<RwLock<UdpStats>>,
    recv_buffer: Mutex<BytesMut>,
}

impl UdpTransport {
    /// Bind a new UDP transport
    ///
    /// Must be called from within a tokio runtime. Bind failure is returned to
    /// the caller; it is the only fatal error this transport produces.
    pub async fn new(config: UdpConfig) -> Result<Self> {
        if config.max_message_size > MAX_UDP_PAYLOAD {
            return Err(TransportError::configuration(
                format!("UDP max message size cannot exceed {} bytes", MAX_UDP_PAYLOAD),
                Some("max_message_size"),
            ));
        }
        if config.buffer_size == 0 {
            return Err(TransportError::configuration(
                "UDP buffer size must be non-zero",
                Some("buffer_size"),
            ));
        }

        let socket = UdpSocket::bind(config.bind_address)
            .await
            .map_err(|source| TransportError::Bind {
                address: config.bind_address,
                source,
            })?;

        if let Some(remote) = config.remote_address {
            socket.connect(remote).await.map_err(|e| {
                TransportError::network_with_source(
                    format!("Failed to connect UDP socket to {}", remote),
                    e,
                )
            })?;
            info!("UDP socket connected to: {}", remote);
        }

        let local = socket.local_addr().unwrap_or(config.bind_address);
        info!("UDP transport bound on: {}", local);

        Ok(Self {
            recv_buffer: Mutex::new(BytesMut::with_capacity(config.buffer_size + 1)),
            config,
            socket: Arc::new(socket),
            stats: Arc::new(RwLock::new(UdpStats::default())),
        })
    }

    /// Send one datagram to the connected remote
    pub async fn send(&self, data: &[u8]) -> Result<()> {
        self.check_size(data)?;

        let timeout_ms = self.config.send_timeout.as_millis() as u64;
        let result = timeout(self.config.send_timeout, self.socket.send(data))
            .await
            .map_err(|_| TransportError::timeout("UDP send", timeout_ms))
            .and_then(|r| {
                r.map_err(|e| TransportError::network_with_source("Failed to send UDP packet", e))
            });

        self.record_send(&result).await;
        debug!("Sent UDP packet: {} bytes", data.len());
        result.map(|_| ())
    }

    /// Send to specific address (for unconnected mode)
    pub async fn send_to(&self, data: &[u8], addr: SocketAddr) -> Result<()> {
        self.check_size(data)?;

        let timeout_ms = self.config.send_timeout.as_millis() as u64;
        let result = timeout(self.config.send_timeout, self.socket.send_to(data, addr))
            .await
            .map_err(|_| TransportError::timeout("UDP send_to", timeout_ms))
            .and_then(|r| {
                r.map_err(|e| TransportError::network_with_source("Failed to send UDP packet", e))
            });

        self.record_send(&result).await;
        debug!("Sent UDP packet to {}: {} bytes", addr, data.len());
        result.map(|_| ())
    }

    /// Receive one datagram from any peer
    ///
    /// Waits until a datagram arrives. Cancel-safe: dropping the future before
    /// completion loses no data. A datagram that does not fit the buffer is
    /// returned as [`TransportError::Truncated`], never as a short payload.
    pub async fn receive_from(&self) -> Result<(Bytes, SocketAddr)> {
        let capacity = self.config.buffer_size;
        let mut buffer = self.recv_buffer.lock().await;
        // One spare byte: a read that fills it means the datagram was cut
        buffer.resize(capacity + 1, 0);

        let (bytes_received, sender) = match self.socket.recv_from(&mut buffer).await {
            Ok(received) => received,
            Err(e) => {
                self.stats.write().await.errors += 1;
                return Err(TransportError::network_with_source(
                    "Failed to receive UDP packet",
                    e,
                ));
            }
        };

        if bytes_received > capacity {
            self.stats.write().await.errors += 1;
            return Err(TransportError::Truncated {
                capacity,
                from: sender,
            });
        }

        let payload = Bytes::copy_from_slice(&buffer[..bytes_received]);

        let mut stats = self.stats.write().await;
        stats.packets_received += 1;
        stats.bytes_received += bytes_received as u64;
        stats.last_activity = Some(Instant::now());

        debug!("Received UDP packet from {}: {} bytes", sender, bytes_received);

        Ok((payload, sender))
    }

    /// Receive with an upper bound on the wait
    pub async fn receive_from_timeout(&self, wait: Duration) -> Result<(Bytes, SocketAddr)> {
        timeout(wait, self.receive_from())
            .await
            .map_err(|_| TransportError::timeout("UDP recv_from", wait.as_millis() as u64))?
    }

    /// Get transport statistics
    pub async fn get_stats(&self) -> UdpStats {
        self.stats.read().await.clone()
    }

    /// Get local address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket
            .local_addr()
            .map_err(|e| TransportError::network_with_source("Failed to get local address", e))
    }

    pub fn config(&self) -> &UdpConfig {
        &self.config
    }

    fn check_size(&self, data: &[u8]) -> Result<()> {
        if data.len() > self.config.max_message_size {
            return Err(TransportError::protocol(format!(
                "Message size {} exceeds maximum {}",
                data.len(),
                self.config.max_message_size
            )));
        }
        Ok(())
    }

    async fn record_send(&self, result: &Result<usize>) {
        let mut stats = self.stats.write().await;
        match result {
            Ok(bytes_sent) => {
                stats.packets_sent += 1;
                stats.bytes_sent += *bytes_sent as u64;
                stats.last_activity = Some(Instant::now());
            }
            Err(_) => stats.errors += 1,
        }
    }
}
