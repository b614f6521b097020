//! The metadata registry: the raw set of declared types.
//!
//! The registry is a pure data holder populated once at startup.  It performs
//! no resolution; the [`HierarchyBuilder`](crate::HierarchyBuilder) and
//! [`BindingTable`](crate::BindingTable) read from it after [`freeze`].
//!
//! [`freeze`]: MetadataRegistry::freeze

use std::collections::HashSet;

use tracing::{debug, info};

use crate::declaration::{
    ConnectorTypeDeclaration, ContractDeclaration, DECLARATIONS, Declaration,
    ImplementationDeclaration,
};
use crate::error::{CoreResult, DeclarationError, StateError};

/// Declared contracts, implementations and connector types.
///
/// All three share one identifier namespace.  Entries keep registration order.
#[derive(Debug, Default)]
pub struct MetadataRegistry {
    ids: HashSet<String>,
    contracts: Vec<ContractDeclaration>,
    implementations: Vec<ImplementationDeclaration>,
    connector_types: Vec<ConnectorTypeDeclaration>,
    frozen: bool,
}

impl MetadataRegistry {
    /// Creates an empty, open registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one declaration.
    ///
    /// # Errors
    ///
    /// - [`StateError::RegistryFrozen`] after [`freeze`](Self::freeze)
    /// - [`DeclarationError::DuplicateDeclaration`] if the identifier is taken
    pub fn register(&mut self, declaration: impl Into<Declaration>) -> CoreResult<()> {
        let declaration = declaration.into();
        let id = declaration.id();

        if self.frozen {
            return Err(StateError::RegistryFrozen { id: id.to_owned() }.into());
        }
        if !self.ids.insert(id.to_owned()) {
            return Err(DeclarationError::DuplicateDeclaration { id: id.to_owned() }.into());
        }

        debug!(id, kind = declaration.kind_name(), "Registered declaration");
        match declaration {
            Declaration::Contract(c) => self.contracts.push(c),
            Declaration::Implementation(i) => self.implementations.push(i),
            Declaration::ConnectorType(c) => self.connector_types.push(c),
        }
        Ok(())
    }

    /// Registers every declaration of `iter`, stopping at the first error.
    pub fn register_all<I>(&mut self, iter: I) -> CoreResult<()>
    where
        I: IntoIterator,
        I::Item: Into<Declaration>,
    {
        iter.into_iter().try_for_each(|d| self.register(d))
    }

    /// Registers every declaration contributed by the attribute macros.
    ///
    /// Returns the number of declarations registered.
    pub fn register_declared(&mut self) -> CoreResult<usize> {
        let count = DECLARATIONS.len();
        self.register_all(DECLARATIONS.iter().map(|make| make()))?;
        info!(count, "Registered link-time declarations");
        Ok(count)
    }

    /// Closes registration.  Calling it again has no effect.
    pub fn freeze(&mut self) {
        if !self.frozen {
            self.frozen = true;
            info!(
                contracts = self.contracts.len(),
                implementations = self.implementations.len(),
                connector_types = self.connector_types.len(),
                "Metadata registry frozen"
            );
        }
    }

    /// Returns whether [`freeze`](Self::freeze) has been called.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Declared contracts in registration order.
    pub fn contracts(&self) -> &[ContractDeclaration] {
        &self.contracts
    }

    /// Declared implementations in registration order.
    pub fn implementations(&self) -> &[ImplementationDeclaration] {
        &self.implementations
    }

    /// Declared connector types in registration order.
    pub fn connector_types(&self) -> &[ConnectorTypeDeclaration] {
        &self.connector_types
    }

    /// Returns whether any declaration uses `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Total number of declarations.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
