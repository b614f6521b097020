//! Configuration for the ChatOverflow runtime.
//!
//! Configuration is layered with figment; see [`loader`] for the source
//! order. The schema covers logging, the connectors to establish at startup
//! and per-plugin sections.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    ConnectorConfig, LogFormat, LogLevel, LogOutput, LoggingConfig, OverflowConfig,
    SpanEventConfig,
};
pub use validation::validate_config;
