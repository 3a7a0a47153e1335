//! # Message Encoding
//!
//! Serialises [`Message`] and [`Packet`] values into datagram bytes. Encoding
//! is infallible for any message that [`MessageBuilder::build`] accepts; the
//! builder is where addresses and string arguments are validated.
//!
//! ```rust
//! use codec::{decode, encode, MessageBuilder};
//!
//! let msg = MessageBuilder::new("/editor/highlights")
//!     .int(1)
//!     .int(1).int(5).int(1).int(10)
//!     .int(500)
//!     .build()
//!     .unwrap();
//!
//! let bytes = encode(&msg);
//! assert_eq!(bytes.len() % 4, 0);
//! assert_eq!(decode(&bytes).unwrap(), msg);
//! ```

use crate::constants::*;
use crate::error::{CodecError, CodecResult};
use crate::message::{Arg, Bundle, Message, Packet};

/// Exact encoded size of a message in bytes
pub fn encoded_len(msg: &Message) -> usize {
    let args: usize = msg
        .args
        .iter()
        .map(|arg| match arg {
            Arg::Int(_) | Arg::Float(_) => 4,
            Arg::Str(s) => padded_str_len(s.len()),
        })
        .sum();
    padded_str_len(msg.address.len()) + padded_str_len(1 + msg.args.len()) + args
}

/// Encode a message into a fresh buffer
pub fn encode(msg: &Message) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_len(msg));
    encode_into(msg, &mut buf);
    buf
}

/// Append an encoded message to `buf`
pub fn encode_into(msg: &Message, buf: &mut Vec<u8>) {
    write_str(buf, msg.address.as_bytes());

    let mut tags = Vec::with_capacity(1 + msg.args.len());
    tags.push(TYPE_TAG_PREFIX);
    tags.extend(msg.args.iter().map(Arg::tag));
    write_str(buf, &tags);

    for arg in &msg.args {
        match arg {
            Arg::Int(v) => buf.extend_from_slice(&v.to_be_bytes()),
            Arg::Float(v) => buf.extend_from_slice(&v.to_bits().to_be_bytes()),
            Arg::Str(s) => write_str(buf, s.as_bytes()),
        }
    }
}

/// Encode a message or bundle
pub fn encode_packet(packet: &Packet) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_packet_into(packet, &mut buf);
    buf
}

fn encode_packet_into(packet: &Packet, buf: &mut Vec<u8>) {
    match packet {
        Packet::Message(msg) => encode_into(msg, buf),
        Packet::Bundle(bundle) => encode_bundle_into(bundle, buf),
    }
}

fn encode_bundle_into(bundle: &Bundle, buf: &mut Vec<u8>) {
    buf.extend_from_slice(BUNDLE_PREFIX);
    buf.extend_from_slice(&bundle.time_tag.as_u64().to_be_bytes());
    for element in &bundle.content {
        let size_at = buf.len();
        buf.extend_from_slice(&[0u8; 4]);
        encode_packet_into(element, buf);
        let size = (buf.len() - size_at - 4) as u32;
        buf[size_at..size_at + 4].copy_from_slice(&size.to_be_bytes());
    }
}

fn write_str(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(bytes);
    let pad = padded_str_len(bytes.len()) - bytes.len();
    buf.extend(std::iter::repeat(0u8).take(pad));
}

/// Fluent constructor for outgoing messages
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    address: String,
    args: Vec<Arg>,
}

impl MessageBuilder {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            args: Vec::new(),
        }
    }

    pub fn int(mut self, value: i32) -> Self {
        self.args.push(Arg::Int(value));
        self
    }

    pub fn float(mut self, value: f32) -> Self {
        self.args.push(Arg::Float(value));
        self
    }

    pub fn string(mut self, value: impl Into<String>) -> Self {
        self.args.push(Arg::Str(value.into()));
        self
    }

    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Validate and produce the message
    pub fn build(self) -> CodecResult<Message> {
        if !self.address.starts_with('/') || self.address.contains('\0') {
            return Err(CodecError::InvalidAddress {
                address: self.address,
            });
        }
        if let Some(index) = self
            .args
            .iter()
            .position(|a| matches!(a, Arg::Str(s) if s.contains('\0')))
        {
            return Err(CodecError::InteriorNul { index });
        }
        Ok(Message {
            address: self.address,
            args: self.args,
        })
    }

    /// Validate and encode in one step
    pub fn encode(self) -> CodecResult<Vec<u8>> {
        self.build().map(|msg| encode(&msg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_matches_reference_layout() {
        // Byte-for-byte what the python harness produces for (1, 1, 5, 1, 10, 500)
        let bytes = MessageBuilder::new("/editor/highlights")
            .int(1)
            .int(1)
            .int(5)
            .int(1)
            .int(10)
            .int(500)
            .encode()
            .unwrap();

        let mut expected = b"/editor/highlights\0\0".to_vec();
        expected.extend_from_slice(b",iiiiii\0");
        for v in [1i32, 1, 5, 1, 10, 500] {
            expected.extend_from_slice(&v.to_be_bytes());
        }
        assert_eq!(bytes, expected);
    }

    #[test]
    fn test_address_exactly_aligned_gets_full_pad_word() {
        // "/abc" is 4 bytes, so the terminator needs a whole extra word
        let msg = MessageBuilder::new("/abc").build().unwrap();
        let bytes = encode(&msg);
        assert_eq!(&bytes[..8], b"/abc\0\0\0\0");
        assert_eq!(&bytes[8..], b",\0\0\0");
        assert_eq!(bytes.len(), encoded_len(&msg));
    }

    #[test]
    fn test_builder_rejects_bad_input() {
        assert!(matches!(
            MessageBuilder::new("editor").build(),
            Err(CodecError::InvalidAddress { .. })
        ));
        assert_eq!(
            MessageBuilder::new("/a").int(1).string("b\0d").build().unwrap_err(),
            CodecError::InteriorNul { index: 1 }
        );
    }

    #[test]
    fn test_bundle_sizes_are_patched() {
        let msg = MessageBuilder::new("/a").int(9).build().unwrap();
        let packet = Packet::Bundle(Bundle {
            time_tag: Default::default(),
            content: vec![Packet::Message(msg.clone())],
        });
        let bytes = encode_packet(&packet);

        assert_eq!(&bytes[..8], BUNDLE_PREFIX);
        let size = u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]) as usize;
        assert_eq!(size, encoded_len(&msg));
        assert_eq!(bytes.len(), BUNDLE_HEADER_SIZE + 4 + size);
    }
}
