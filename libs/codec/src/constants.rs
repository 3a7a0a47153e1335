//! # Wire Constants
//!
//! Fixed values of the datagram format. These must stay stable; both the
//! bridge and every producer depend on them.

/// Every padded field ends on a multiple of this many bytes
pub const ALIGNMENT: usize = 4;

/// First character of every type-tag string
pub const TYPE_TAG_PREFIX: u8 = b',';

/// 32-bit big-endian signed integer
pub const TAG_INT: u8 = b'i';

/// 32-bit big-endian IEEE 754 float
pub const TAG_FLOAT: u8 = b'f';

/// NUL-terminated, padded string
pub const TAG_STRING: u8 = b's';

/// Leading bytes of a bundle, terminator included
pub const BUNDLE_PREFIX: &[u8; 8] = b"#bundle\0";

/// Bundle header: prefix plus 8-byte time tag
pub const BUNDLE_HEADER_SIZE: usize = 16;

/// Nesting limit for bundles within bundles
pub const MAX_BUNDLE_DEPTH: usize = 8;

/// Round `len` up to the next multiple of [`ALIGNMENT`]
#[inline]
pub const fn padded_len(len: usize) -> usize {
    (len + ALIGNMENT - 1) & !(ALIGNMENT - 1)
}

/// Size on the wire of a string field: bytes, terminator, padding
#[inline]
pub const fn padded_str_len(len: usize) -> usize {
    padded_len(len + 1)
}
