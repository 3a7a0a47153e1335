//! # Highlight Bridge Packet Codec
//!
//! ## Purpose
//!
//! Pure encoding/decoding of the open-sound-control style datagrams the live
//! coding environment emits. The codec is generic: it knows nothing about
//! highlights, only about addresses, type tags and argument payloads.
//!
//! ## Wire Layout
//!
//! ```text
//! +----------------------+----------------------+---------------------------+
//! | address\0 (pad to 4) | ,tags\0 (pad to 4)   | payloads in tag order     |
//! +----------------------+----------------------+---------------------------+
//!   i: 4-byte big-endian i32
//!   f: 4-byte big-endian f32
//!   s: string\0 padded to 4
//! ```
//!
//! Bundles wrap packets: `#bundle\0`, an 8-byte time tag, then elements each
//! prefixed by a 4-byte big-endian size.
//!
//! ## Architecture Role
//!
//! ```text
//! libs/types → [codec] → network/
//!     ↑           ↓          ↓
//! Pure Data   Wire Rules  Sockets
//! ```
//!
//! ## What This Crate Does NOT Contain
//! - Socket management (belongs in network/)
//! - Highlight schema interpretation (belongs in the bridge normalizer)
//!
//! Decoding fails closed: an unknown type tag, a short payload or trailing
//! bytes reject the whole packet rather than yielding a partial argument list.
//! [`decode_messages`] applies that per bundle element, so one bad element
//! does not take its framed siblings with it.

pub mod builder;
pub mod constants;
pub mod error;
pub mod message;
pub mod parser;

pub use builder::{encode, encode_into, encode_packet, encoded_len, MessageBuilder};
pub use constants::*;
pub use error::{CodecError, CodecResult};
pub use message::{Arg, Bundle, Message, Packet, TimeTag};
pub use parser::{decode, decode_messages, decode_packet};
