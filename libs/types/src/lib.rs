//! # Highlight Bridge Types
//!
//! Plain data shared by every crate in the bridge:
//!
//! - [`StreamKey`] / [`StreamKeyRange`]: which pattern stream a highlight belongs to
//! - [`PositionRange`]: zero-based row/column span inside the editor buffer
//! - [`HighlightEvent`]: the canonical event produced by the normalizer
//! - [`RenderCommand`]: the only two verbs the editor collaborator understands
//!
//! ## Architecture Role
//!
//! ```text
//! libs/types → codec → network
//!     ↑           ↓        ↓
//! Pure Data   Wire Rules  Sockets
//! ```
//!
//! Nothing in this crate performs I/O or holds a clock; timestamps are supplied
//! by the caller.

pub mod command;
pub mod common;
pub mod highlight;

pub use command::RenderCommand;
pub use common::errors::RangeError;
pub use highlight::{
    EventMetadata, HighlightEvent, PositionRange, StreamKey, StreamKeyRange, MAX_STREAM_KEYS,
};
