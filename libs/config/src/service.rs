//! Runtime defaults for the bridge service

/// Tracker expiry scan
pub mod tracker {
    /// Expiry poll interval; upper bound on clear latency (milliseconds)
    pub const EXPIRY_POLL_MS: u64 = 50;

    /// Poll intervals above this would make highlights visibly overstay
    pub const MAX_EXPIRY_POLL_MS: u64 = 1_000;
}

/// Command dispatcher
pub mod dispatcher {
    /// Queued-but-undelivered commands before supersession kicks in
    pub const QUEUE_CAPACITY: usize = 256;

    /// Bounded wait for one editor delivery (milliseconds)
    pub const SEND_TIMEOUT_MS: u64 = 100;
}

/// Normalizer
pub mod normalizer {
    /// Row used for column-only events when nothing better is known
    pub const DEFAULT_ROW: u32 = 0;
}
