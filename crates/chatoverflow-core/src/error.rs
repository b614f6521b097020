//! Error taxonomy for the plugin core.
//!
//! Errors are grouped by when they can occur:
//!
//! - [`DeclarationError`]: raised while building the registry, hierarchy, or
//!   binding table. Fatal to initialization.
//! - [`LookupError`]: raised at runtime by connector management and
//!   instantiation. Recoverable by the caller.
//! - [`StateError`]: lifecycle misuse (e.g. registering after freeze).
//! - [`CoreError::Instantiation`]: a plugin constructor failed; the original
//!   error is kept as the source.

use thiserror::Error;

use crate::types::{ConnectorKey, ConnectorTypeId, ContractId, ContractKind, ImplementationId};

/// Boxed error type returned by plugin constructors and connector hooks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Declaration Errors
// =============================================================================

/// Errors in the declared contract / implementation set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeclarationError {
    /// The same identifier was declared twice.
    #[error("type '{id}' is declared more than once")]
    DuplicateDeclaration {
        /// The duplicated identifier.
        id: String,
    },

    /// A contract names a parent that was never declared.
    #[error("contract '{contract}' declares unknown parent '{parent}'")]
    UnknownParent {
        /// The contract with the dangling parent.
        contract: ContractId,
        /// The missing parent identifier.
        parent: ContractId,
    },

    /// The parent relation contains a cycle.
    #[error("contract hierarchy contains a cycle: {}", format_cycle(.cycle))]
    CyclicHierarchy {
        /// Members of the cycle, each followed by its parent.
        cycle: Vec<ContractId>,
    },

    /// A contract's kind differs from its parent's kind.
    #[error("contract '{contract}' is a {kind} but its parent '{parent}' is a {parent_kind}")]
    ContractKindMismatch {
        /// The child contract.
        contract: ContractId,
        /// Kind declared by the child.
        kind: ContractKind,
        /// The parent contract.
        parent: ContractId,
        /// Kind declared by the parent.
        parent_kind: ContractKind,
    },

    /// An implementation names a contract missing from the hierarchy.
    #[error("implementation '{implementation}' implements unknown contract '{contract}'")]
    UnknownContract {
        /// The implementation.
        implementation: ImplementationId,
        /// The missing contract.
        contract: ContractId,
    },

    /// A requirement implementation does not name a connector type.
    #[error(
        "implementation '{implementation}' of requirement contract '{contract}' must declare a connector type"
    )]
    MissingConnectorDeclaration {
        /// The implementation.
        implementation: ImplementationId,
        /// The requirement contract it implements.
        contract: ContractId,
    },

    /// An input or output implementation names a connector type.
    #[error(
        "implementation '{implementation}' of {kind} contract '{contract}' may not declare connector '{connector}'"
    )]
    ConnectorNotAllowed {
        /// The implementation.
        implementation: ImplementationId,
        /// The contract it implements.
        contract: ContractId,
        /// The contract's kind.
        kind: ContractKind,
        /// The connector type that was declared.
        connector: ConnectorTypeId,
    },

    /// An implementation names a connector type that was never declared.
    #[error("implementation '{implementation}' requires undeclared connector type '{connector}'")]
    UnknownConnectorType {
        /// The implementation.
        implementation: ImplementationId,
        /// The missing connector type.
        connector: ConnectorTypeId,
    },

    /// The same (contract, implementation) pair was bound twice.
    #[error("implementation '{implementation}' is bound to contract '{contract}' more than once")]
    DuplicateBinding {
        /// The contract.
        contract: ContractId,
        /// The implementation.
        implementation: ImplementationId,
    },
}

fn format_cycle(cycle: &[ContractId]) -> String {
    let mut parts: Vec<&str> = cycle.iter().map(ContractId::as_str).collect();
    if let Some(first) = cycle.first() {
        parts.push(first.as_str());
    }
    parts.join(" -> ")
}

// =============================================================================
// Lookup Errors
// =============================================================================

/// Errors raised by runtime lookups and connector management.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// No binding exists for the requested pair.
    #[error("no implementation '{implementation}' is bound to contract '{contract}'")]
    UnknownImplementation {
        /// The requested contract.
        contract: ContractId,
        /// The requested implementation.
        implementation: ImplementationId,
    },

    /// No connector is registered under the key.
    #[error("connector '{key}' not found")]
    ConnectorNotFound {
        /// The missing key.
        key: ConnectorKey,
    },

    /// The implementation needs a connector but no key was given.
    #[error("implementation '{implementation}' requires a '{connector_type}' connector key")]
    MissingConnectorKey {
        /// The implementation.
        implementation: ImplementationId,
        /// The connector type it needs.
        connector_type: ConnectorTypeId,
    },

    /// A connector is already registered under the key.
    #[error("connector '{key}' already exists")]
    DuplicateConnector {
        /// The duplicated key.
        key: ConnectorKey,
    },

    /// The connector instance reports a different type than its key.
    #[error("connector registered as '{key}' reports type '{actual}'")]
    ConnectorTypeMismatch {
        /// The key it was registered under.
        key: ConnectorKey,
        /// The type the instance reports.
        actual: ConnectorTypeId,
    },
}

// =============================================================================
// State Errors
// =============================================================================

/// Lifecycle misuse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// Registration attempted after the registry was frozen.
    #[error("metadata registry is frozen, cannot register '{id}'")]
    RegistryFrozen {
        /// The identifier that was being registered.
        id: String,
    },

    /// Mutation attempted on an already built structure.
    #[error("{what} is already built and immutable")]
    ImmutableTree {
        /// Which structure was targeted.
        what: &'static str,
    },

    /// A build step was started before the registry was frozen.
    #[error("metadata registry must be frozen before building the {what}")]
    RegistryNotFrozen {
        /// Which structure was being built.
        what: &'static str,
    },
}

// =============================================================================
// CoreError
// =============================================================================

/// Coarse classification of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid declarations, fatal at startup.
    Declaration,
    /// Missing runtime entries, recoverable.
    Lookup,
    /// A plugin constructor failed.
    Construction,
    /// Lifecycle misuse, a programming defect.
    State,
}

/// Unified error type for the plugin core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Declaration error.
    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    /// Lookup error.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// State error.
    #[error(transparent)]
    State(#[from] StateError),

    /// The plugin constructor returned an error.
    #[error("failed to instantiate '{implementation}': {source}")]
    Instantiation {
        /// The implementation whose constructor failed.
        implementation: ImplementationId,
        /// The original constructor error.
        #[source]
        source: BoxError,
    },
}

impl CoreError {
    /// Returns the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Declaration(_) => ErrorCategory::Declaration,
            Self::Lookup(_) => ErrorCategory::Lookup,
            Self::State(_) => ErrorCategory::State,
            Self::Instantiation { .. } => ErrorCategory::Construction,
        }
    }

    /// Returns `true` if the caller can recover (e.g. by configuring a connector).
    pub fn is_recoverable(&self) -> bool {
        self.category() == ErrorCategory::Lookup
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_closes_loop() {
        let err = DeclarationError::CyclicHierarchy {
            cycle: vec![ContractId::from("A"), ContractId::from("B")],
        };
        assert_eq!(
            err.to_string(),
            "contract hierarchy contains a cycle: A -> B -> A"
        );
    }

    #[test]
    fn test_categories() {
        let lookup: CoreError = LookupError::ConnectorNotFound {
            key: ConnectorKey::new("TwitchConnector", "acct1"),
        }
        .into();
        assert_eq!(lookup.category(), ErrorCategory::Lookup);
        assert!(lookup.is_recoverable());

        let state: CoreError = StateError::RegistryFrozen { id: "X".into() }.into();
        assert_eq!(state.category(), ErrorCategory::State);
        assert!(!state.is_recoverable());

        let construction = CoreError::Instantiation {
            implementation: ImplementationId::from("X"),
            source: "boom".into(),
        };
        assert_eq!(construction.category(), ErrorCategory::Construction);
        assert!(std::error::Error::source(&construction).is_some());
    }
}
