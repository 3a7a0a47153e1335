use types::{RenderCommand, StreamKey};

/// Context information for send operations to aid in debugging
#[derive(Debug, Clone)]
pub struct SendContext {
    /// Stream the command belonged to
    pub stream_key: StreamKey,
    /// "set" or "clear"
    pub verb: &'static str,
    /// Target endpoint hint, if available
    pub target: Option<String>,
}

impl SendContext {
    pub fn for_command(command: &RenderCommand) -> Self {
        Self {
            stream_key: command.key(),
            verb: if command.is_clear() { "clear" } else { "set" },
            target: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SinkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Send failed: {error} ({verb} for stream {key}, target: {target:?})",
            verb = .context.verb,
            key = .context.stream_key,
            target = .context.target)]
    SendFailed { error: String, context: SendContext },

    #[error("Sink closed")]
    Closed,

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SinkError {
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    pub fn send_failed(error: impl Into<String>, context: SendContext) -> Self {
        Self::SendFailed {
            error: error.into(),
            context,
        }
    }

    /// Whether the dispatcher should keep the sink and carry on
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SinkError::Closed | SinkError::InvalidConfig(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::PositionRange;

    #[test]
    fn test_send_failed_display() {
        let cmd = RenderCommand::Set {
            key: StreamKey(2),
            range: PositionRange::on_row(0, 0, 3).unwrap(),
        };
        let err = SinkError::send_failed("refused", SendContext::for_command(&cmd).with_target("127.0.0.1:6011"));
        let text = err.to_string();
        assert!(text.contains("refused"));
        assert!(text.contains("set for stream 2"));
        assert!(text.contains("127.0.0.1:6011"));
        assert!(err.is_retryable());
        assert!(!SinkError::Closed.is_retryable());
    }
}
