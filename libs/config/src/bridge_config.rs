//! Bridge configuration
//!
//! Every section carries `#[serde(default)]`, so a TOML file or the
//! environment only needs to name the values that differ from the defaults.

use crate::error::ConfigError;
use crate::{protocol, service};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use types::StreamKeyRange;

/// Environment variable prefix, e.g. `HIGHLIGHT_BRIDGE__INGRESS__PORT=7000`
pub const ENV_PREFIX: &str = "HIGHLIGHT_BRIDGE";

/// Section and key separator for environment overrides
const ENV_SEPARATOR: &str = "__";

/// Top-level bridge configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub ingress: IngressConfig,
    pub streams: StreamsConfig,
    pub normalizer: NormalizerConfig,
    pub tracker: TrackerConfig,
    pub dispatcher: DispatcherConfig,
    pub editor: EditorConfig,
    pub logging: LoggingConfig,
}

/// Receiving socket and accepted address pattern
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IngressConfig {
    pub host: String,
    pub port: u16,
    pub address: String,
    pub buffer_size: usize,
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: protocol::DEFAULT_INGRESS_PORT,
            address: protocol::DEFAULT_HIGHLIGHT_ADDRESS.to_string(),
            buffer_size: protocol::DEFAULT_RECV_BUFFER_SIZE,
        }
    }
}

impl IngressConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        resolve("ingress.host", &self.host, self.port)
    }
}

/// Valid stream keys, inclusive on both ends
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamsConfig {
    pub min_key: u32,
    pub max_key: u32,
}

impl Default for StreamsConfig {
    fn default() -> Self {
        Self {
            min_key: protocol::DEFAULT_MIN_STREAM_KEY,
            max_key: protocol::DEFAULT_MAX_STREAM_KEY,
        }
    }
}

impl StreamsConfig {
    pub fn key_range(&self) -> Result<StreamKeyRange, ConfigError> {
        StreamKeyRange::new(self.min_key, self.max_key)
            .map_err(|e| ConfigError::invalid("streams", e.to_string()))
    }
}

/// How column-only events pick their row
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStrategyKind {
    /// Always `normalizer.default_row`
    #[default]
    Fixed,
    /// Row of the stream's most recent positioned event, else `default_row`
    LastActive,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub row_strategy: RowStrategyKind,
    pub default_row: u32,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            row_strategy: RowStrategyKind::Fixed,
            default_row: service::normalizer::DEFAULT_ROW,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub expiry_poll_ms: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            expiry_poll_ms: service::tracker::EXPIRY_POLL_MS,
        }
    }
}

impl TrackerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.expiry_poll_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub queue_capacity: usize,
    pub send_timeout_ms: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            queue_capacity: service::dispatcher::QUEUE_CAPACITY,
            send_timeout_ms: service::dispatcher::SEND_TIMEOUT_MS,
        }
    }
}

impl DispatcherConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

/// Which editor collaborator receives render commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    /// Forward encoded commands to the editor plugin over UDP
    #[default]
    Udp,
    /// Log commands only
    Log,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EditorConfig {
    pub mode: EditorMode,
    pub host: String,
    pub port: u16,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            mode: EditorMode::Udp,
            host: "127.0.0.1".to_string(),
            port: protocol::DEFAULT_EDITOR_PORT,
        }
    }
}

impl EditorConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        resolve("editor.host", &self.host, self.port)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub debug: bool,
    pub json: bool,
    /// Periodic stats log; 0 disables
    pub stats_interval_secs: u64,
}

impl BridgeConfig {
    /// Load defaults, then the optional TOML file, then `HIGHLIGHT_BRIDGE__*`
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, default_environment())
    }

    /// Parse a TOML document on top of the defaults, without environment overrides
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(toml, config_crate::FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading bridge config: {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(env);

        let config = builder.build()?;
        let loaded: Self = config.try_deserialize()?;
        debug!(?loaded, "Bridge configuration loaded");
        Ok(loaded)
    }

    /// Reject configurations the bridge cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let address = &self.ingress.address;
        if address.is_empty() {
            return Err(ConfigError::invalid("ingress.address", "must not be empty"));
        }
        if !address.starts_with('/') {
            return Err(ConfigError::invalid(
                "ingress.address",
                format!("'{}' must start with '/'", address),
            ));
        }
        if self.ingress.buffer_size < protocol::MIN_RECV_BUFFER_SIZE {
            return Err(ConfigError::invalid(
                "ingress.buffer_size",
                format!(
                    "{} is smaller than the largest datagram ({} bytes)",
                    self.ingress.buffer_size,
                    protocol::MIN_RECV_BUFFER_SIZE
                ),
            ));
        }

        let keys = self.streams.key_range()?;

        let poll = self.tracker.expiry_poll_ms;
        if poll == 0 {
            return Err(ConfigError::invalid("tracker.expiry_poll_ms", "must be non-zero"));
        }
        if poll > service::tracker::MAX_EXPIRY_POLL_MS {
            return Err(ConfigError::invalid(
                "tracker.expiry_poll_ms",
                format!(
                    "{} exceeds maximum of {} ms",
                    poll,
                    service::tracker::MAX_EXPIRY_POLL_MS
                ),
            ));
        }

        // Supersession keeps at most one command per key
        if self.dispatcher.queue_capacity < keys.len() {
            return Err(ConfigError::invalid(
                "dispatcher.queue_capacity",
                format!(
                    "{} is smaller than the {} valid stream keys",
                    self.dispatcher.queue_capacity,
                    keys.len()
                ),
            ));
        }

        self.ingress.socket_addr()?;
        if self.editor.mode == EditorMode::Udp {
            self.editor.socket_addr()?;
        }

        Ok(())
    }
}

fn default_environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator(ENV_SEPARATOR)
        .separator(ENV_SEPARATOR)
        .try_parsing(true)
}

fn resolve(field: &'static str, host: &str, port: u16) -> Result<SocketAddr, ConfigError> {
    (host, port)
        .to_socket_addrs()
        .map_err(|e| ConfigError::invalid(field, format!("cannot resolve '{}': {}", host, e)))?
        .next()
        .ok_or_else(|| ConfigError::invalid(field, format!("'{}' resolved to no address", host)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn toml_file() -> NamedTempFile {
        tempfile::Builder::new().suffix(".toml").tempfile().unwrap()
    }

    fn env_from(pairs: &[(&str, &str)]) -> Environment {
        let mut map = config_crate::Map::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.to_string());
        }
        default_environment().source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.ingress.port, 6013);
        assert_eq!(config.ingress.address, "/editor/highlights");
        assert_eq!(config.streams.min_key, 0);
        assert_eq!(config.streams.max_key, 15);
        assert_eq!(config.normalizer.row_strategy, RowStrategyKind::Fixed);
        assert_eq!(config.normalizer.default_row, 0);
        assert_eq!(config.tracker.expiry_poll_ms, 50);
        assert_eq!(config.dispatcher.queue_capacity, 256);
        assert_eq!(config.dispatcher.send_timeout_ms, 100);
        assert_eq!(config.editor.mode, EditorMode::Udp);
        assert_eq!(config.editor.port, 6011);
        assert!(!config.logging.debug);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.ingress.socket_addr().unwrap(),
            "127.0.0.1:6013".parse().unwrap()
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BridgeConfig::from_toml_str(
            r#"
            [ingress]
            port = 7000

            [normalizer]
            row_strategy = "last_active"
            default_row = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.ingress.port, 7000);
        assert_eq!(config.ingress.address, "/editor/highlights");
        assert_eq!(config.normalizer.row_strategy, RowStrategyKind::LastActive);
        assert_eq!(config.normalizer.default_row, 3);
        assert_eq!(config.tracker.expiry_poll_ms, 50);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = toml_file();
        writeln!(
            file,
            r#"
            [streams]
            min_key = 1
            max_key = 8

            [editor]
            mode = "log"
            "#
        )
        .unwrap();

        let config = BridgeConfig::load_with_env(Some(file.path()), env_from(&[])).unwrap();
        assert_eq!(config.streams.key_range().unwrap().len(), 8);
        assert_eq!(config.editor.mode, EditorMode::Log);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = BridgeConfig::load_with_env(
            Some(Path::new("/nonexistent/bridge.toml")),
            env_from(&[]),
        );
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = toml_file();
        writeln!(file, "[ingress]\nport = 7000\n").unwrap();

        let env = env_from(&[
            ("HIGHLIGHT_BRIDGE__INGRESS__PORT", "7100"),
            ("HIGHLIGHT_BRIDGE__TRACKER__EXPIRY_POLL_MS", "20"),
            ("HIGHLIGHT_BRIDGE__LOGGING__DEBUG", "true"),
        ]);
        let config = BridgeConfig::load_with_env(Some(file.path()), env).unwrap();

        assert_eq!(config.ingress.port, 7100);
        assert_eq!(config.tracker.expiry_poll_ms, 20);
        assert!(config.logging.debug);
    }

    #[test]
    fn test_validate_address() {
        let mut config = BridgeConfig::default();
        config.ingress.address = String::new();
        assert!(config.validate().is_err());

        config.ingress.address = "editor/highlights".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ingress.address"));
    }

    #[test]
    fn test_validate_key_range() {
        let mut config = BridgeConfig::default();
        config.streams.min_key = 10;
        config.streams.max_key = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_poll_interval() {
        let mut config = BridgeConfig::default();
        config.tracker.expiry_poll_ms = 0;
        assert!(config.validate().is_err());

        config.tracker.expiry_poll_ms = 1_001;
        assert!(config.validate().is_err());

        config.tracker.expiry_poll_ms = 1_000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_queue_capacity_covers_keys() {
        let mut config = BridgeConfig::default();
        config.dispatcher.queue_capacity = 15;
        assert!(config.validate().is_err());

        config.dispatcher.queue_capacity = 16;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_buffer_size() {
        let mut config = BridgeConfig::default();
        config.ingress.buffer_size = 0;
        assert!(config.validate().is_err());

        config.ingress.buffer_size = 128;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ingress.buffer_size"));

        config.ingress.buffer_size = protocol::MIN_RECV_BUFFER_SIZE;
        assert!(config.validate().is_ok());
    }
}
