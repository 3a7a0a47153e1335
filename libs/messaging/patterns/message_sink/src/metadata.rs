/// Information about a sink for monitoring/debugging
#[derive(Debug, Clone, Default)]
pub struct SinkMetadata {
    /// Human-readable sink name
    pub name: String,

    /// Sink type (udp, log, collector, ...)
    pub sink_type: String,

    /// Connection endpoint if applicable
    pub endpoint: Option<String>,

    /// Current connection state
    pub state: ConnectionState,

    /// Commands sent successfully
    pub commands_sent: u64,

    /// Commands that failed to send
    pub commands_failed: u64,
}

impl SinkMetadata {
    /// Create new metadata with name and type
    pub fn new(name: impl Into<String>, sink_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sink_type: sink_type.into(),
            ..Default::default()
        }
    }

    /// Set endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set connection state
    pub fn with_state(mut self, state: ConnectionState) -> Self {
        self.state = state;
        self
    }

    pub fn with_counts(mut self, sent: u64, failed: u64) -> Self {
        self.commands_sent = sent;
        self.commands_failed = failed;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}
