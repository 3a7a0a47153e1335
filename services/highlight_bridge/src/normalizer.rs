//! Event Normalizer
//!
//! Maps decoded messages on the highlight address into [`HighlightEvent`]s.
//! Two argument layouts are accepted, distinguished by argument count:
//!
//! ```text
//! Schema A (6): stream_id:i start_row:i start_col:i end_row:i end_col:i duration:i|f
//! Schema B (7): sound:s cps:f cycle:f orbit:i delta:f start_pos:i end_pos:i
//! ```
//!
//! Schema A durations follow the type tag: `i` is milliseconds, `f` is
//! seconds. Schema B carries columns only; its row comes from the configured
//! [`RowStrategy`].

use bridge_config::{NormalizerConfig, RowStrategyKind};
use codec::{Arg, Message};
use std::collections::HashMap;
use std::time::Instant;
use thiserror::Error;
use types::{EventMetadata, HighlightEvent, PositionRange, RangeError, StreamKey, StreamKeyRange};

const SCHEMA_A_ARGS: usize = 6;
const SCHEMA_B_ARGS: usize = 7;

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("Unknown address: {address}")]
    UnknownAddress { address: String },

    #[error("Schema mismatch for type tags ',{type_tags}': {reason}")]
    SchemaMismatch { type_tags: String, reason: String },

    #[error("Stream key {key} outside valid range {range}")]
    StreamKeyOutOfRange { key: i64, range: StreamKeyRange },

    #[error("Malformed position range: {0}")]
    MalformedRange(#[from] RangeError),

    #[error("Invalid duration: {value}")]
    InvalidDuration { value: f64 },
}

impl NormalizeError {
    fn mismatch(message: &Message, reason: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            type_tags: message.type_tags(),
            reason: reason.into(),
        }
    }
}

/// Row resolution for column-only (Schema B) events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStrategy {
    Fixed(u32),
    /// Row of the stream's last positioned event, falling back to `default_row`
    LastActive { default_row: u32 },
}

impl From<&NormalizerConfig> for RowStrategy {
    fn from(config: &NormalizerConfig) -> Self {
        match config.row_strategy {
            RowStrategyKind::Fixed => Self::Fixed(config.default_row),
            RowStrategyKind::LastActive => Self::LastActive {
                default_row: config.default_row,
            },
        }
    }
}

#[derive(Debug)]
pub struct Normalizer {
    address: String,
    keys: StreamKeyRange,
    strategy: RowStrategy,
    /// Only populated under `LastActive`; bounded by the key range
    last_rows: HashMap<StreamKey, u32>,
}

impl Normalizer {
    pub fn new(address: impl Into<String>, keys: StreamKeyRange, strategy: RowStrategy) -> Self {
        Self {
            address: address.into(),
            keys,
            strategy,
            last_rows: HashMap::new(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn strategy(&self) -> RowStrategy {
        self.strategy
    }

    /// Record the row a stream is currently playing on
    ///
    /// Schema A events call this implicitly. Ignored under a fixed strategy
    /// and for keys outside the valid range.
    pub fn note_row(&mut self, key: StreamKey, row: u32) {
        if matches!(self.strategy, RowStrategy::LastActive { .. }) && self.keys.contains(key) {
            self.last_rows.insert(key, row);
        }
    }

    pub fn normalize(
        &mut self,
        message: &Message,
        received_at: Instant,
    ) -> Result<HighlightEvent, NormalizeError> {
        if message.address != self.address {
            return Err(NormalizeError::UnknownAddress {
                address: message.address.clone(),
            });
        }

        match message.args.len() {
            SCHEMA_A_ARGS => self.schema_a(message, received_at),
            SCHEMA_B_ARGS => self.schema_b(message, received_at),
            n => Err(NormalizeError::mismatch(
                message,
                format!(
                    "expected {} or {} arguments, got {}",
                    SCHEMA_A_ARGS, SCHEMA_B_ARGS, n
                ),
            )),
        }
    }

    fn schema_a(
        &mut self,
        message: &Message,
        received_at: Instant,
    ) -> Result<HighlightEvent, NormalizeError> {
        let args = &message.args;
        let stream_id = int_arg(message, 0, "stream_id")?;
        let start_row = int_arg(message, 1, "start_row")?;
        let start_col = int_arg(message, 2, "start_col")?;
        let end_row = int_arg(message, 3, "end_row")?;
        let end_col = int_arg(message, 4, "end_col")?;

        let duration_ms = match &args[5] {
            Arg::Int(ms) => {
                if *ms < 0 {
                    return Err(NormalizeError::InvalidDuration { value: *ms as f64 });
                }
                *ms as u64
            }
            Arg::Float(secs) => seconds_to_ms(*secs)?,
            other => {
                return Err(NormalizeError::mismatch(
                    message,
                    format!("duration must be int or float, got {}", other.type_name()),
                ))
            }
        };

        let key = self.stream_key(stream_id)?;
        let range = PositionRange::from_wire(start_row, start_col, end_row, end_col)?;
        self.note_row(key, range.start_row);

        Ok(HighlightEvent::new(key, range, duration_ms, received_at))
    }

    fn schema_b(
        &mut self,
        message: &Message,
        received_at: Instant,
    ) -> Result<HighlightEvent, NormalizeError> {
        let sound = message.args[0]
            .as_str()
            .ok_or_else(|| NormalizeError::mismatch(message, "sound must be a string"))?
            .to_string();
        let cps = float_arg(message, 1, "cps")?;
        let cycle = float_arg(message, 2, "cycle")?;
        let orbit = int_arg(message, 3, "orbit")?;
        let delta = float_arg(message, 4, "delta")?;
        let start_pos = int_arg(message, 5, "start_pos")?;
        let end_pos = int_arg(message, 6, "end_pos")?;

        let duration_ms = seconds_to_ms(delta)?;
        let key = self.stream_key(orbit)?;
        let row = self.resolve_row(key);
        let range = PositionRange::on_row(
            row,
            column("start_pos", start_pos)?,
            column("end_pos", end_pos)?,
        )?;

        let metadata = EventMetadata {
            sound: Some(sound),
            cycle: Some(cycle),
            cps: Some(cps),
        };

        Ok(HighlightEvent::new(key, range, duration_ms, received_at).with_metadata(metadata))
    }

    fn stream_key(&self, raw: i32) -> Result<StreamKey, NormalizeError> {
        let out_of_range = || NormalizeError::StreamKeyOutOfRange {
            key: raw as i64,
            range: self.keys,
        };
        let key = u32::try_from(raw).map(StreamKey).map_err(|_| out_of_range())?;
        if !self.keys.contains(key) {
            return Err(out_of_range());
        }
        Ok(key)
    }

    fn resolve_row(&self, key: StreamKey) -> u32 {
        match self.strategy {
            RowStrategy::Fixed(row) => row,
            RowStrategy::LastActive { default_row } => {
                self.last_rows.get(&key).copied().unwrap_or(default_row)
            }
        }
    }
}

fn int_arg(message: &Message, index: usize, field: &str) -> Result<i32, NormalizeError> {
    message.args[index].as_int().ok_or_else(|| {
        NormalizeError::mismatch(
            message,
            format!(
                "{} must be int, got {}",
                field,
                message.args[index].type_name()
            ),
        )
    })
}

/// Floats accept ints too; some producers send whole numbers untyped
fn float_arg(message: &Message, index: usize, field: &str) -> Result<f32, NormalizeError> {
    match &message.args[index] {
        Arg::Float(v) => Ok(*v),
        Arg::Int(v) => Ok(*v as f32),
        other => Err(NormalizeError::mismatch(
            message,
            format!("{} must be float, got {}", field, other.type_name()),
        )),
    }
}

fn seconds_to_ms(secs: f32) -> Result<u64, NormalizeError> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(NormalizeError::InvalidDuration { value: secs as f64 });
    }
    Ok((secs as f64 * 1000.0).round() as u64)
}

fn column(field: &'static str, value: i32) -> Result<u32, RangeError> {
    u32::try_from(value).map_err(|_| RangeError::NegativeCoordinate {
        field,
        value: value as i64,
    })
}
