//! Bridge counters
//!
//! Lock-free counters shared by the ingress loop and the dispatcher task.
//! Every dropped datagram, event or command increments exactly one of them.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

#[derive(Debug, Default)]
pub struct BridgeStats {
    datagrams_received: AtomicU64,
    codec_errors: AtomicU64,
    unknown_address: AtomicU64,
    normalize_errors: AtomicU64,
    events_applied: AtomicU64,
    rejected_keys: AtomicU64,
    commands_enqueued: AtomicU64,
    commands_superseded: AtomicU64,
    commands_delivered: AtomicU64,
    sink_errors: AtomicU64,
    recv_errors: AtomicU64,
}

/// Point-in-time copy of [`BridgeStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub datagrams_received: u64,
    pub codec_errors: u64,
    pub unknown_address: u64,
    pub normalize_errors: u64,
    pub events_applied: u64,
    pub rejected_keys: u64,
    pub commands_enqueued: u64,
    pub commands_superseded: u64,
    pub commands_delivered: u64,
    pub sink_errors: u64,
    pub recv_errors: u64,
}

macro_rules! counter {
    ($($inc:ident => $field:ident),* $(,)?) => {
        impl BridgeStats {
            $(
                #[inline]
                pub fn $inc(&self) {
                    self.$field.fetch_add(1, Ordering::Relaxed);
                }
            )*
        }
    };
}

counter! {
    record_datagram => datagrams_received,
    record_codec_error => codec_errors,
    record_unknown_address => unknown_address,
    record_normalize_error => normalize_errors,
    record_event_applied => events_applied,
    record_rejected_key => rejected_keys,
    record_enqueued => commands_enqueued,
    record_delivered => commands_delivered,
    record_sink_error => sink_errors,
    record_recv_error => recv_errors,
}

impl BridgeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Several queued commands dropped in favour of a newer one
    pub fn record_superseded(&self, count: u64) {
        self.commands_superseded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            datagrams_received: self.datagrams_received.load(Ordering::Relaxed),
            codec_errors: self.codec_errors.load(Ordering::Relaxed),
            unknown_address: self.unknown_address.load(Ordering::Relaxed),
            normalize_errors: self.normalize_errors.load(Ordering::Relaxed),
            events_applied: self.events_applied.load(Ordering::Relaxed),
            rejected_keys: self.rejected_keys.load(Ordering::Relaxed),
            commands_enqueued: self.commands_enqueued.load(Ordering::Relaxed),
            commands_superseded: self.commands_superseded.load(Ordering::Relaxed),
            commands_delivered: self.commands_delivered.load(Ordering::Relaxed),
            sink_errors: self.sink_errors.load(Ordering::Relaxed),
            recv_errors: self.recv_errors.load(Ordering::Relaxed),
        }
    }

    pub fn log_summary(&self) {
        let s = self.snapshot();
        info!(
            datagrams = s.datagrams_received,
            codec_errors = s.codec_errors,
            unknown_address = s.unknown_address,
            normalize_errors = s.normalize_errors,
            events = s.events_applied,
            rejected_keys = s.rejected_keys,
            enqueued = s.commands_enqueued,
            superseded = s.commands_superseded,
            delivered = s.commands_delivered,
            sink_errors = s.sink_errors,
            recv_errors = s.recv_errors,
            "Bridge stats"
        );
    }
}

impl StatsSnapshot {
    /// Datagrams or events that never produced a command
    pub fn dropped(&self) -> u64 {
        self.codec_errors + self.unknown_address + self.normalize_errors + self.rejected_keys
    }
}
