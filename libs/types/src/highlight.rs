//! Highlight value types
//!
//! A highlight is identified by its [`StreamKey`]; at most one highlight per key
//! is visible at a time. Ranges are validated at construction so that every
//! [`HighlightEvent`] that exists is well-formed.

use crate::RangeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Hard ceiling on the number of distinct stream keys a bridge will track
pub const MAX_STREAM_KEYS: u32 = 64;

/// Identifier of a logical pattern stream (stream id or 0-based orbit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamKey(pub u32);

impl StreamKey {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    /// Key as a wire integer; keys never exceed `i32::MAX`
    pub fn as_wire(self) -> i32 {
        i32::try_from(self.0).unwrap_or(i32::MAX)
    }
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for StreamKey {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Inclusive range of stream keys the bridge accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawKeyRange", into = "RawKeyRange")]
pub struct StreamKeyRange {
    min: u32,
    max: u32,
}

#[derive(Serialize, Deserialize)]
struct RawKeyRange {
    min: u32,
    max: u32,
}

impl TryFrom<RawKeyRange> for StreamKeyRange {
    type Error = RangeError;

    fn try_from(raw: RawKeyRange) -> Result<Self, Self::Error> {
        Self::new(raw.min, raw.max)
    }
}

impl From<StreamKeyRange> for RawKeyRange {
    fn from(range: StreamKeyRange) -> Self {
        Self {
            min: range.min,
            max: range.max,
        }
    }
}

impl StreamKeyRange {
    /// Create a validated inclusive range
    pub fn new(min: u32, max: u32) -> Result<Self, RangeError> {
        if min > max {
            return Err(RangeError::EmptyKeyRange { min, max });
        }
        if max > i32::MAX as u32 {
            return Err(RangeError::KeyTooLarge {
                max,
                limit: i32::MAX as u32,
            });
        }
        if max - min >= MAX_STREAM_KEYS {
            return Err(RangeError::KeyRangeTooWide {
                min,
                max,
                limit: MAX_STREAM_KEYS,
            });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Number of keys in the range
    pub fn len(&self) -> usize {
        (self.max - self.min) as usize + 1
    }

    /// Always false; a range holds at least one key
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, key: StreamKey) -> bool {
        (self.min..=self.max).contains(&key.0)
    }
}

impl Default for StreamKeyRange {
    /// Sixteen orbits, `0..=15`
    fn default() -> Self {
        Self { min: 0, max: 15 }
    }
}

impl fmt::Display for StreamKeyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

/// Zero-based row/column span in the editor buffer
///
/// Start is always lexicographically less than or equal to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionRange {
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl PositionRange {
    /// Build a range, rejecting inverted spans
    pub fn new(start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Result<Self, RangeError> {
        if (start_row, start_col) > (end_row, end_col) {
            return Err(RangeError::Inverted {
                start_row,
                start_col,
                end_row,
                end_col,
            });
        }
        Ok(Self {
            start_row,
            start_col,
            end_row,
            end_col,
        })
    }

    /// Build a range from signed wire values
    pub fn from_wire(start_row: i32, start_col: i32, end_row: i32, end_col: i32) -> Result<Self, RangeError> {
        Self::new(
            non_negative("start_row", start_row)?,
            non_negative("start_col", start_col)?,
            non_negative("end_row", end_row)?,
            non_negative("end_col", end_col)?,
        )
    }

    /// Span on a single row
    pub fn on_row(row: u32, start_col: u32, end_col: u32) -> Result<Self, RangeError> {
        Self::new(row, start_col, row, end_col)
    }
}

impl fmt::Display for PositionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})",
            self.start_row, self.start_col, self.end_row, self.end_col
        )
    }
}

fn non_negative(field: &'static str, value: i32) -> Result<u32, RangeError> {
    u32::try_from(value).map_err(|_| RangeError::NegativeCoordinate {
        field,
        value: value as i64,
    })
}

/// Diagnostic fields carried alongside an event
///
/// Never consulted by highlight logic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventMetadata {
    pub sound: Option<String>,
    pub cycle: Option<f32>,
    pub cps: Option<f32>,
}

/// Canonical highlight event, produced by the normalizer
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightEvent {
    pub stream_key: StreamKey,
    pub position_range: PositionRange,
    /// Visible lifetime; zero clears immediately
    pub duration_ms: u64,
    /// Monotonic arrival time assigned at ingress
    pub received_at: Instant,
    pub metadata: Option<EventMetadata>,
}

impl HighlightEvent {
    pub fn new(
        stream_key: StreamKey,
        position_range: PositionRange,
        duration_ms: u64,
        received_at: Instant,
    ) -> Self {
        Self {
            stream_key,
            position_range,
            duration_ms,
            received_at,
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: EventMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn is_clear(&self) -> bool {
        self.duration_ms == 0
    }
}
