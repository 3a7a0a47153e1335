//! Codec errors for datagram decoding
//!
//! Every variant carries the byte offset where decoding stopped so dropped
//! packets can be diagnosed from a single debug line.

use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Reasons a datagram could not be decoded
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Packet ended before a field could be read
    #[error("Truncated packet: need {need} bytes, got {got} (context: {context})")]
    Truncated {
        need: usize,
        got: usize,
        context: &'static str,
    },

    /// Total length is not a multiple of 4
    #[error("Packet length {len} is not a multiple of 4")]
    MisalignedLength { len: usize },

    /// String field has no NUL terminator
    #[error("Missing terminator for {field} starting at offset {offset}")]
    MissingTerminator { field: &'static str, offset: usize },

    /// Padding after a string contained non-zero bytes
    #[error("Non-zero padding byte at offset {offset}")]
    InvalidPadding { offset: usize },

    /// String field is not valid UTF-8
    #[error("Invalid UTF-8 in {field} at offset {offset}")]
    InvalidUtf8 { field: &'static str, offset: usize },

    /// Address pattern is empty or does not start with '/'
    #[error("Invalid address pattern: {address:?}")]
    InvalidAddress { address: String },

    /// Type-tag string missing or not starting with ','
    #[error("Missing type-tag string at offset {offset}")]
    MissingTypeTags { offset: usize },

    /// Type tag outside the supported set
    #[error("Unsupported type tag '{tag}' for argument {index}")]
    UnsupportedType { tag: char, index: usize },

    /// Bytes left over after every declared argument was read
    #[error("{extra} trailing bytes after {declared} declared arguments")]
    TrailingBytes { extra: usize, declared: usize },

    /// Bundle framing is malformed
    #[error("Invalid bundle at offset {offset}: {reason}")]
    InvalidBundle { offset: usize, reason: &'static str },

    /// String argument contains a NUL byte and cannot be encoded
    #[error("String argument {index} contains an interior NUL byte")]
    InteriorNul { index: usize },

    /// Bundles nested past the depth limit
    #[error("Bundle nesting depth {depth} exceeds limit {limit}")]
    BundleTooDeep { depth: usize, limit: usize },
}

impl CodecError {
    pub fn truncated(need: usize, got: usize, context: &'static str) -> Self {
        Self::Truncated { need, got, context }
    }

    /// Short label for counters and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Truncated { .. } => "truncated",
            Self::MisalignedLength { .. } => "misaligned_length",
            Self::MissingTerminator { .. } => "missing_terminator",
            Self::InvalidPadding { .. } => "invalid_padding",
            Self::InvalidUtf8 { .. } => "invalid_utf8",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::MissingTypeTags { .. } => "missing_type_tags",
            Self::UnsupportedType { .. } => "unsupported_type",
            Self::TrailingBytes { .. } => "trailing_bytes",
            Self::InvalidBundle { .. } => "invalid_bundle",
            Self::InteriorNul { .. } => "interior_nul",
            Self::BundleTooDeep { .. } => "bundle_too_deep",
        }
    }
}
