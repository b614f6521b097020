//! Declarations fed into the [`MetadataRegistry`](crate::MetadataRegistry).
//!
//! A declaration is plain data describing one contract, implementation, or
//! connector type.  Declarations are either built by hand and passed to
//! `register`, or contributed at link time by the `#[contract]`,
//! `#[implementation]` and `#[connector]` attribute macros, which append a
//! constructor function to [`DECLARATIONS`].

use std::fmt;

use linkme::distributed_slice;

use crate::plugin::PluginFactory;
use crate::types::{ConnectorTypeId, ContractId, ContractKind, ImplementationId};

/// Declaration constructors contributed by the attribute macros.
///
/// Each linked crate that uses a marker adds one entry per declared type;
/// [`MetadataRegistry::register_declared`](crate::MetadataRegistry::register_declared)
/// drains them into a registry.
#[distributed_slice]
pub static DECLARATIONS: [fn() -> Declaration];

/// One declared type.
#[derive(Debug, Clone)]
pub enum Declaration {
    /// An abstract contract.
    Contract(ContractDeclaration),
    /// A concrete plugin implementation.
    Implementation(ImplementationDeclaration),
    /// A connector type.
    ConnectorType(ConnectorTypeDeclaration),
}

impl Declaration {
    /// The declared identifier.
    pub fn id(&self) -> &str {
        match self {
            Self::Contract(c) => c.id.as_str(),
            Self::Implementation(i) => i.id.as_str(),
            Self::ConnectorType(c) => c.id.as_str(),
        }
    }

    /// Short name of the declaration kind, used in logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Contract(_) => "contract",
            Self::Implementation(_) => "implementation",
            Self::ConnectorType(_) => "connector type",
        }
    }
}

impl From<ContractDeclaration> for Declaration {
    fn from(decl: ContractDeclaration) -> Self {
        Self::Contract(decl)
    }
}

impl From<ImplementationDeclaration> for Declaration {
    fn from(decl: ImplementationDeclaration) -> Self {
        Self::Implementation(decl)
    }
}

impl From<ConnectorTypeDeclaration> for Declaration {
    fn from(decl: ConnectorTypeDeclaration) -> Self {
        Self::ConnectorType(decl)
    }
}

/// An abstract contract with an optional parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDeclaration {
    pub id: ContractId,
    pub kind: ContractKind,
    pub parent: Option<ContractId>,
}

impl ContractDeclaration {
    /// A root contract.
    pub fn new(id: impl Into<ContractId>, kind: ContractKind) -> Self {
        Self {
            id: id.into(),
            kind,
            parent: None,
        }
    }

    /// Sets the parent contract.
    pub fn with_parent(mut self, parent: impl Into<ContractId>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// A concrete implementation of one contract.
#[derive(Clone)]
pub struct ImplementationDeclaration {
    pub id: ImplementationId,
    pub contract: ContractId,
    pub connector: Option<ConnectorTypeId>,
    pub factory: PluginFactory,
}

impl ImplementationDeclaration {
    /// An implementation without a connector requirement.
    pub fn new(
        id: impl Into<ImplementationId>,
        contract: impl Into<ContractId>,
        factory: PluginFactory,
    ) -> Self {
        Self {
            id: id.into(),
            contract: contract.into(),
            connector: None,
            factory,
        }
    }

    /// Sets the required connector type.
    pub fn with_connector(mut self, connector: impl Into<ConnectorTypeId>) -> Self {
        self.connector = Some(connector.into());
        self
    }
}

impl fmt::Debug for ImplementationDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImplementationDeclaration")
            .field("id", &self.id)
            .field("contract", &self.contract)
            .field("connector", &self.connector)
            .finish_non_exhaustive()
    }
}

/// A connector type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorTypeDeclaration {
    pub id: ConnectorTypeId,
}

impl ConnectorTypeDeclaration {
    pub fn new(id: impl Into<ConnectorTypeId>) -> Self {
        Self { id: id.into() }
    }
}
