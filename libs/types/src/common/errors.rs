//! Validation errors for highlight data
//!
//! Raised while constructing [`PositionRange`](crate::PositionRange) and
//! [`StreamKeyRange`](crate::StreamKeyRange) values from untrusted input.

use thiserror::Error;

/// Errors that can occur while building highlight value types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// Start position comes after end position
    #[error("Range start ({start_row},{start_col}) is after end ({end_row},{end_col})")]
    Inverted {
        start_row: u32,
        start_col: u32,
        end_row: u32,
        end_col: u32,
    },

    /// A coordinate was negative on the wire
    #[error("Negative coordinate for {field}: {value}")]
    NegativeCoordinate { field: &'static str, value: i64 },

    /// Stream key bounds are inverted
    #[error("Stream key range is empty: min {min} > max {max}")]
    EmptyKeyRange { min: u32, max: u32 },

    /// Stream key does not fit the signed 32-bit wire integer
    #[error("Stream key {max} exceeds the wire maximum {limit}")]
    KeyTooLarge { max: u32, limit: u32 },

    /// Stream key range wider than the protocol allows
    #[error("Stream key range {min}..={max} exceeds the maximum of {limit} keys")]
    KeyRangeTooWide { min: u32, max: u32, limit: u32 },
}
