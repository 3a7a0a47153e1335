//! # Datagram Parser
//!
//! ## Purpose
//!
//! Validating decoder for single messages and bundles. Each padded field is
//! checked for its terminator, zeroed padding and 4-byte alignment before the
//! next field is read, and the argument payload must be consumed exactly:
//! a short payload is [`CodecError::Truncated`], leftover bytes are
//! [`CodecError::TrailingBytes`].
//!
//! Strings are copied out; everything else is read in place.

use crate::constants::*;
use crate::error::{CodecError, CodecResult};
use crate::message::{Arg, Bundle, Message, Packet, TimeTag};
use tracing::trace;

/// Cursor over a datagram slice
struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.offset).copied()
    }

    fn take(&mut self, len: usize, context: &'static str) -> CodecResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(CodecError::truncated(len, self.remaining(), context));
        }
        let bytes = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(bytes)
    }

    fn read_u32(&mut self, context: &'static str) -> CodecResult<u32> {
        let bytes = self.take(4, context)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_i32(&mut self) -> CodecResult<i32> {
        Ok(self.read_u32("int argument")? as i32)
    }

    fn read_f32(&mut self) -> CodecResult<f32> {
        Ok(f32::from_bits(self.read_u32("float argument")?))
    }

    fn read_u64(&mut self, context: &'static str) -> CodecResult<u64> {
        let hi = self.read_u32(context)? as u64;
        let lo = self.read_u32(context)? as u64;
        Ok((hi << 32) | lo)
    }

    /// Read a NUL-terminated, zero-padded string field
    fn read_str(&mut self, field: &'static str) -> CodecResult<&'a str> {
        let start = self.offset;
        let rest = &self.data[start..];
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(CodecError::MissingTerminator { field, offset: start })?;

        let field_len = padded_str_len(nul);
        if field_len > rest.len() {
            return Err(CodecError::truncated(field_len, rest.len(), field));
        }
        if let Some(pad) = rest[nul + 1..field_len].iter().position(|&b| b != 0) {
            return Err(CodecError::InvalidPadding {
                offset: start + nul + 1 + pad,
            });
        }

        let text = std::str::from_utf8(&rest[..nul])
            .map_err(|_| CodecError::InvalidUtf8 { field, offset: start })?;
        self.offset += field_len;
        Ok(text)
    }
}

/// Decode a single message
///
/// Bundles are rejected here (their `#bundle` prefix is not a valid address);
/// use [`decode_packet`] for datagrams that may carry either.
pub fn decode(data: &[u8]) -> CodecResult<Message> {
    check_alignment(data)?;
    decode_message(data)
}

/// Decode a message or bundle
pub fn decode_packet(data: &[u8]) -> CodecResult<Packet> {
    check_alignment(data)?;
    decode_packet_at(data, 0)
}

fn check_alignment(data: &[u8]) -> CodecResult<()> {
    if data.is_empty() {
        return Err(CodecError::truncated(ALIGNMENT, 0, "address"));
    }
    if data.len() % ALIGNMENT != 0 {
        return Err(CodecError::MisalignedLength { len: data.len() });
    }
    Ok(())
}

fn decode_packet_at(data: &[u8], depth: usize) -> CodecResult<Packet> {
    if data.starts_with(BUNDLE_PREFIX) {
        decode_bundle(data, depth).map(Packet::Bundle)
    } else {
        decode_message(data).map(Packet::Message)
    }
}

fn decode_message(data: &[u8]) -> CodecResult<Message> {
    let mut reader = Reader::new(data);

    let address = reader.read_str("address")?;
    if !address.starts_with('/') {
        return Err(CodecError::InvalidAddress {
            address: address.to_string(),
        });
    }

    let tags_offset = reader.offset;
    if reader.peek() != Some(TYPE_TAG_PREFIX) {
        return Err(CodecError::MissingTypeTags { offset: tags_offset });
    }
    let tags = &reader.read_str("type tags")?.as_bytes()[1..];

    // Reject unknown tags before touching the payload
    if let Some(index) = tags
        .iter()
        .position(|t| !matches!(*t, TAG_INT | TAG_FLOAT | TAG_STRING))
    {
        return Err(CodecError::UnsupportedType {
            tag: tags[index] as char,
            index,
        });
    }

    let mut args = Vec::with_capacity(tags.len());
    for &tag in tags {
        let arg = match tag {
            TAG_INT => Arg::Int(reader.read_i32()?),
            TAG_FLOAT => Arg::Float(reader.read_f32()?),
            _ => Arg::Str(reader.read_str("string argument")?.to_string()),
        };
        args.push(arg);
    }

    if !reader.is_empty() {
        return Err(CodecError::TrailingBytes {
            extra: reader.remaining(),
            declared: tags.len(),
        });
    }

    Ok(Message {
        address: address.to_string(),
        args,
    })
}

/// Decode a datagram into its messages, isolating bad bundle elements
///
/// Framing failures fail the call: a bad datagram, a bad bundle header or an
/// element size that does not fit. Once an element is framed, a failure to
/// decode it takes its own slot and its siblings are still decoded. A nested
/// bundle whose framing fails is one failed slot, with none of its contents.
pub fn decode_messages(data: &[u8]) -> CodecResult<Vec<CodecResult<Message>>> {
    check_alignment(data)?;
    if !data.starts_with(BUNDLE_PREFIX) {
        return decode_message(data).map(|msg| vec![Ok(msg)]);
    }

    let mut out = Vec::new();
    collect_elements(data, 0, &mut out)?;
    Ok(out)
}

fn collect_elements(
    data: &[u8],
    depth: usize,
    out: &mut Vec<CodecResult<Message>>,
) -> CodecResult<()> {
    let (_, elements) = frame_bundle(data, depth)?;
    for element in elements {
        if element.starts_with(BUNDLE_PREFIX) {
            let mark = out.len();
            if let Err(e) = collect_elements(element, depth + 1, out) {
                out.truncate(mark);
                out.push(Err(e));
            }
        } else {
            out.push(decode_message(element));
        }
    }
    Ok(())
}

fn decode_bundle(data: &[u8], depth: usize) -> CodecResult<Bundle> {
    let (time_tag, elements) = frame_bundle(data, depth)?;
    let content = elements
        .into_iter()
        .map(|element| decode_packet_at(element, depth + 1))
        .collect::<CodecResult<Vec<_>>>()?;

    trace!(
        elements = content.len(),
        depth,
        "decoded bundle"
    );

    Ok(Bundle { time_tag, content })
}

/// Split a bundle into its time tag and size-delimited element slices
fn frame_bundle(data: &[u8], depth: usize) -> CodecResult<(TimeTag, Vec<&[u8]>)> {
    if depth >= MAX_BUNDLE_DEPTH {
        return Err(CodecError::BundleTooDeep {
            depth: depth + 1,
            limit: MAX_BUNDLE_DEPTH,
        });
    }

    let mut reader = Reader::new(data);
    reader.take(BUNDLE_PREFIX.len(), "bundle prefix")?;
    let time_tag = TimeTag::from_u64(reader.read_u64("bundle time tag")?);

    let mut elements = Vec::new();
    while !reader.is_empty() {
        let size_offset = reader.offset;
        let size = reader.read_u32("bundle element size")? as usize;
        if size == 0 || size % ALIGNMENT != 0 {
            return Err(CodecError::InvalidBundle {
                offset: size_offset,
                reason: "element size must be a non-zero multiple of 4",
            });
        }
        elements.push(reader.take(size, "bundle element")?);
    }

    Ok((time_tag, elements))
}
