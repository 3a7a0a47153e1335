//! # Highlight Bridge Configuration
//!
//! Centralised defaults and configuration loading for the bridge.
//!
//! ## Sources, lowest precedence first
//!
//! 1. Built-in defaults ([`BridgeConfig::default`])
//! 2. Optional TOML file
//! 3. Environment variables, `HIGHLIGHT_BRIDGE__<SECTION>__<KEY>`
//! 4. CLI flags (applied by the binary after loading)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use bridge_config::BridgeConfig;
//!
//! let config = BridgeConfig::load(Some("config/bridge.toml".as_ref())).unwrap();
//! config.validate().unwrap();
//! println!("listening on {}", config.ingress.socket_addr().unwrap());
//! ```

pub mod bridge_config;
pub mod error;
pub mod protocol;
pub mod service;

pub use bridge_config::{
    BridgeConfig, DispatcherConfig, EditorConfig, EditorMode, IngressConfig, LoggingConfig,
    NormalizerConfig, RowStrategyKind, StreamsConfig, TrackerConfig, ENV_PREFIX,
};
pub use error::ConfigError;
