//! # Highlight Bridge
//!
//! Turns highlight events from a live coding environment into set/clear
//! commands for an editor.
//!
//! ## Data Flow
//!
//! ```text
//! UDP socket → codec::decode_messages → Normalizer → Tracker → Dispatcher → CommandSink
//!    (ingress)                                         ↑
//!                                               expiry tick
//! ```
//!
//! The [`Bridge`] task owns the socket and the [`Tracker`]; the [`Dispatcher`]
//! runs its own delivery task so a slow editor never stalls ingestion.

pub mod bridge;
pub mod dispatcher;
pub mod error;
pub mod ingress;
pub mod normalizer;
pub mod stats;
pub mod tracker;

pub use bridge::Bridge;
pub use dispatcher::{Dispatcher, DispatcherHandle};
pub use error::{BridgeError, Result};
pub use ingress::Ingress;
pub use normalizer::{NormalizeError, Normalizer, RowStrategy};
pub use stats::{BridgeStats, StatsSnapshot};
pub use tracker::{ActiveHighlight, Tracker};
