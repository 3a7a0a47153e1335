//! Configuration errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// File, environment or deserialisation failure
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config_crate::ConfigError),

    /// Value loaded but semantically invalid
    #[error("Invalid configuration for {field}: {message}")]
    Invalid { field: &'static str, message: String },
}

impl ConfigError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}
