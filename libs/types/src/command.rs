//! Render commands sent to the editor collaborator

use crate::{PositionRange, StreamKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two verbs the editor understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RenderCommand {
    /// Show (or replace) the highlight for a stream
    Set { key: StreamKey, range: PositionRange },
    /// Remove the highlight for a stream
    Clear { key: StreamKey },
}

impl RenderCommand {
    pub fn key(&self) -> StreamKey {
        match self {
            RenderCommand::Set { key, .. } | RenderCommand::Clear { key } => *key,
        }
    }

    pub fn is_clear(&self) -> bool {
        matches!(self, RenderCommand::Clear { .. })
    }
}

impl fmt::Display for RenderCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderCommand::Set { key, range } => write!(f, "Set({key}, {range})"),
            RenderCommand::Clear { key } => write!(f, "Clear({key})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let set = RenderCommand::Set {
            key: StreamKey(1),
            range: PositionRange::new(1, 5, 1, 10).unwrap(),
        };
        assert_eq!(set.to_string(), "Set(1, (1,5)-(1,10))");
        assert_eq!(RenderCommand::Clear { key: StreamKey(1) }.to_string(), "Clear(1)");
        assert!(!set.is_clear());
        assert_eq!(set.key(), StreamKey(1));
    }

    #[test]
    fn test_tagged_json() {
        let clear = RenderCommand::Clear { key: StreamKey(3) };
        let json = serde_json::to_string(&clear).unwrap();
        assert_eq!(json, r#"{"op":"clear","key":3}"#);
        assert_eq!(serde_json::from_str::<RenderCommand>(&json).unwrap(), clear);
    }
}
