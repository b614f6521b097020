//! Runtime error types.

use chatoverflow_core::{BoxError, ConnectorKey, ConnectorTypeId, CoreError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Declaration, lookup or instantiation failure from the core engine.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No provider is registered for the connector type.
    #[error("No connector provider registered for type '{connector_type}'")]
    NoProvider { connector_type: ConnectorTypeId },

    /// A provider failed to establish a connector.
    #[error("Connector provider failed to connect {key}")]
    Provider {
        key: ConnectorKey,
        #[source]
        source: BoxError,
    },

    /// The operation needs a completed `startup()`.
    #[error("Runtime has not been started")]
    NotStarted,

    /// `startup()` was called twice.
    #[error("Runtime is already started")]
    AlreadyStarted,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
