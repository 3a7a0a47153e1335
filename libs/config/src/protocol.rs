//! Wire-level defaults
//!
//! Ports and addresses the live coding environment and editor plugins agree on.

/// Port the bridge listens on for highlight events
pub const DEFAULT_INGRESS_PORT: u16 = 6013;

/// Port the editor plugin listens on for render commands
pub const DEFAULT_EDITOR_PORT: u16 = 6011;

/// Address pattern of highlight events
pub const DEFAULT_HIGHLIGHT_ADDRESS: &str = "/editor/highlights";

/// Default stream keys: sixteen orbits, `0..=15`
pub const DEFAULT_MIN_STREAM_KEY: u32 = 0;
pub const DEFAULT_MAX_STREAM_KEY: u32 = 15;

/// Receive buffer per datagram
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 64 * 1024;

/// Largest payload a single IPv4 UDP datagram can carry; smaller receive
/// buffers would let the OS cut datagrams short
pub const MIN_RECV_BUFFER_SIZE: usize = 65_507;
