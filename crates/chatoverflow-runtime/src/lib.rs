//! ChatOverflow Runtime - host side of the plugin framework.
//!
//! This crate provides:
//! - The startup sequence over `chatoverflow-core` (`OverflowRuntime`)
//! - Connector providers that turn configuration into live connectors
//! - Layered configuration (`chatoverflow.toml`, `CHATOVERFLOW_*` env vars)
//! - Logging configuration
//!
//! ```ignore
//! use chatoverflow_runtime::OverflowRuntime;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = OverflowRuntime::builder()
//!         .provider(TwitchProvider::default())
//!         .build()?;
//!
//!     runtime.startup().await?;
//!     let input = runtime.instantiate("ChatInput", "TwitchChatInputImpl", None).await?;
//!
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod provider;
pub mod runtime;

pub use config::{
    ConfigError, ConfigLoader, ConfigResult, ConnectorConfig, LoggingConfig, OverflowConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use provider::{ConnectorProvider, ProviderRegistry};
pub use runtime::{OverflowRuntime, RuntimeBuilder, RuntimeStats};

// Re-export tracing for use by plugin crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
