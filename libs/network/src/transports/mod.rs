//! Transport implementations

pub mod udp;


pub use udp::{UdpConfig, UdpStats, UdpTransport};
