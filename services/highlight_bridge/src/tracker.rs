//! Highlight State Tracker
//!
//! One active highlight per stream key, last writer wins. The tracker is
//! driven entirely by the caller's clock: `apply` and `expire` take `now`
//! and nothing here reads time on its own, so tests can step time exactly.
//!
//! A `Clear` leaves the tracker only when an entry is removed from the map,
//! which makes a double clear structurally impossible. The debug assertions
//! below guard that property.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use types::{HighlightEvent, PositionRange, RenderCommand, StreamKey, StreamKeyRange};

/// A highlight the editor is currently showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveHighlight {
    pub stream_key: StreamKey,
    pub position_range: PositionRange,
    pub expires_at: Instant,
}

impl ActiveHighlight {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug)]
pub struct Tracker {
    keys: StreamKeyRange,
    active: HashMap<StreamKey, ActiveHighlight>,
    rejected: u64,
}

impl Tracker {
    pub fn new(keys: StreamKeyRange) -> Self {
        Self {
            keys,
            active: HashMap::with_capacity(keys.len()),
            rejected: 0,
        }
    }

    /// Apply one event, returning the commands it produces
    pub fn apply(&mut self, event: &HighlightEvent, now: Instant) -> Vec<RenderCommand> {
        let key = event.stream_key;
        if !self.keys.contains(key) {
            self.rejected += 1;
            warn!(%key, range = %self.keys, "Rejected highlight for stream key outside valid range");
            return Vec::new();
        }

        if event.is_clear() {
            return self.clear(key, now).into_iter().collect();
        }

        let highlight = ActiveHighlight {
            stream_key: key,
            position_range: event.position_range,
            expires_at: now + Duration::from_millis(event.duration_ms),
        };

        match self.active.insert(key, highlight) {
            Some(previous) => debug!(
                %key,
                from = %previous.position_range,
                to = %highlight.position_range,
                "Replaced highlight"
            ),
            None => debug!(%key, range = %highlight.position_range, "New highlight"),
        }
        debug_assert!(self.active.len() <= self.keys.len());

        vec![RenderCommand::Set {
            key,
            range: event.position_range,
        }]
    }

    /// Clear every highlight whose lifetime has passed
    ///
    /// Commands come out in key order.
    pub fn expire(&mut self, now: Instant) -> Vec<RenderCommand> {
        let mut expired: Vec<StreamKey> = self
            .active
            .values()
            .filter(|h| h.is_expired(now))
            .map(|h| h.stream_key)
            .collect();

        if expired.is_empty() {
            return Vec::new();
        }
        expired.sort_unstable();

        expired
            .into_iter()
            .map(|key| {
                let removed = self.active.remove(&key);
                debug_assert!(removed.is_some(), "expiring removed key {}", key);
                debug!(%key, "Highlight expired");
                RenderCommand::Clear { key }
            })
            .collect()
    }

    /// Explicitly clear a key
    ///
    /// Returns `None` when nothing is tracked for it. An entry that has
    /// expired but not been swept is still on screen, so it is cleared too.
    pub fn clear(&mut self, key: StreamKey, now: Instant) -> Option<RenderCommand> {
        let removed = self.active.remove(&key)?;
        debug_assert_eq!(removed.stream_key, key);
        debug!(
            %key,
            early = !removed.is_expired(now),
            "Highlight cleared"
        );
        Some(RenderCommand::Clear { key })
    }

    /// Earliest pending expiry, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        self.active.values().map(|h| h.expires_at).min()
    }

    pub fn active(&self, key: StreamKey) -> Option<&ActiveHighlight> {
        self.active.get(&key)
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Events dropped for an out-of-range key
    pub fn rejected_keys(&self) -> u64 {
        self.rejected
    }

    pub fn key_range(&self) -> StreamKeyRange {
        self.keys
    }
}
