//! Network Infrastructure
//!
//! Datagram transport used by the bridge for both directions: the ingress
//! socket that receives events from the live coding environment and the
//! outbound socket that forwards render commands to the editor.
//!
//! A [`UdpTransport`] is an explicitly constructed resource. Whoever builds it
//! owns the socket; dropping the transport closes it.

pub mod error;
pub mod transports;

pub use error::{Result, TransportError};
pub use transports::udp::{UdpConfig, UdpStats, UdpTransport};

/// Default receive buffer, large enough for any IPv4 datagram
pub const DEFAULT_UDP_BUFFER_SIZE: usize = 64 * 1024;

/// Largest payload a single IPv4 UDP datagram can carry
pub const MAX_UDP_PAYLOAD: usize = 65_507;
