//! Binding of implementations to contracts.
//!
//! The [`BindingTable`] is built once from the declared implementations and
//! the contract hierarchy.  Every entry has been validated against the
//! hierarchy and the declared connector types, so lookups of registered
//! pairs never fail afterwards.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::declaration::{ConnectorTypeDeclaration, ImplementationDeclaration};
use crate::error::{CoreResult, DeclarationError, StateError};
use crate::hierarchy::ContractHierarchy;
use crate::metadata::MetadataRegistry;
use crate::plugin::PluginFactory;
use crate::types::{ConnectorTypeId, ContractId, ContractKind, ImplementationId};

/// A validated implementation-to-contract association.
#[derive(Clone)]
pub struct Binding {
    implementation: ImplementationId,
    contract: ContractId,
    kind: ContractKind,
    connector: Option<ConnectorTypeId>,
    factory: PluginFactory,
}

impl Binding {
    pub fn implementation(&self) -> &ImplementationId {
        &self.implementation
    }

    pub fn contract(&self) -> &ContractId {
        &self.contract
    }

    /// Kind of the bound contract.
    pub fn kind(&self) -> ContractKind {
        self.kind
    }

    /// Connector type the implementation needs, set exactly for requirements.
    pub fn connector_type(&self) -> Option<&ConnectorTypeId> {
        self.connector.as_ref()
    }

    pub fn factory(&self) -> PluginFactory {
        self.factory
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("implementation", &self.implementation)
            .field("contract", &self.contract)
            .field("kind", &self.kind)
            .field("connector", &self.connector)
            .finish_non_exhaustive()
    }
}

/// Immutable map `(contract, implementation) -> Binding`.
pub struct BindingTable {
    hierarchy: Arc<ContractHierarchy>,
    bindings: Vec<Binding>,
    index: HashMap<ContractId, HashMap<ImplementationId, usize>>,
}

impl BindingTable {
    /// Binds every implementation of a frozen registry.
    pub fn from_registry(
        registry: &MetadataRegistry,
        hierarchy: &Arc<ContractHierarchy>,
    ) -> CoreResult<Self> {
        if !registry.is_frozen() {
            return Err(StateError::RegistryNotFrozen {
                what: "binding table",
            }
            .into());
        }
        Self::bind(
            registry.implementations(),
            Arc::clone(hierarchy),
            registry.connector_types(),
        )
    }

    /// Validates and binds `implementations` against `hierarchy`.
    ///
    /// # Errors
    ///
    /// - [`DeclarationError::UnknownContract`] if the contract is not in the hierarchy
    /// - [`DeclarationError::MissingConnectorDeclaration`] for a requirement without connector
    /// - [`DeclarationError::ConnectorNotAllowed`] for an input/output with a connector
    /// - [`DeclarationError::UnknownConnectorType`] if the connector type was never declared
    /// - [`DeclarationError::DuplicateBinding`] if a pair is bound twice
    pub fn bind(
        implementations: &[ImplementationDeclaration],
        hierarchy: Arc<ContractHierarchy>,
        connector_types: &[ConnectorTypeDeclaration],
    ) -> CoreResult<Self> {
        let known_connectors: HashSet<&ConnectorTypeId> =
            connector_types.iter().map(|c| &c.id).collect();

        let mut bindings = Vec::with_capacity(implementations.len());
        let mut index: HashMap<ContractId, HashMap<ImplementationId, usize>> = HashMap::new();

        for decl in implementations {
            let binding = resolve(decl, &hierarchy, &known_connectors)?;

            let slot = index.entry(binding.contract.clone()).or_default();
            if slot.contains_key(&binding.implementation) {
                return Err(DeclarationError::DuplicateBinding {
                    contract: binding.contract,
                    implementation: binding.implementation,
                }
                .into());
            }
            slot.insert(binding.implementation.clone(), bindings.len());

            debug!(
                implementation = %binding.implementation,
                contract = %binding.contract,
                connector = ?binding.connector,
                "Bound implementation"
            );
            bindings.push(binding);
        }

        info!(bindings = bindings.len(), "Binding table built");
        Ok(Self {
            hierarchy,
            bindings,
            index,
        })
    }

    /// The binding of `implementation` to `contract`.
    pub fn get(&self, contract: &str, implementation: &str) -> Option<&Binding> {
        let idx = *self.index.get(contract)?.get(implementation)?;
        self.bindings.get(idx)
    }

    /// Bindings to exactly `contract`, in declaration order.
    pub fn implementations_of(&self, contract: &str) -> Vec<&Binding> {
        self.bindings
            .iter()
            .filter(|b| b.contract == contract)
            .collect()
    }

    /// Bindings to `contract` or any contract below it, in declaration order.
    pub fn satisfying(&self, contract: &str) -> Vec<&Binding> {
        self.bindings
            .iter()
            .filter(|b| self.hierarchy.is_descendant_of(b.contract.as_str(), contract))
            .collect()
    }

    /// The first binding of the implementation `id`.
    pub fn find_implementation(&self, id: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.implementation == id)
    }

    /// All bindings in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The hierarchy the table was validated against.
    pub fn hierarchy(&self) -> &Arc<ContractHierarchy> {
        &self.hierarchy
    }
}

impl fmt::Debug for BindingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingTable")
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}

fn resolve(
    decl: &ImplementationDeclaration,
    hierarchy: &ContractHierarchy,
    known_connectors: &HashSet<&ConnectorTypeId>,
) -> Result<Binding, DeclarationError> {
    let kind = hierarchy
        .kind_of(decl.contract.as_str())
        .ok_or_else(|| DeclarationError::UnknownContract {
            implementation: decl.id.clone(),
            contract: decl.contract.clone(),
        })?;

    match (&decl.connector, kind.requires_connector()) {
        (None, true) => {
            return Err(DeclarationError::MissingConnectorDeclaration {
                implementation: decl.id.clone(),
                contract: decl.contract.clone(),
            });
        }
        (Some(connector), false) => {
            return Err(DeclarationError::ConnectorNotAllowed {
                implementation: decl.id.clone(),
                contract: decl.contract.clone(),
                kind,
                connector: connector.clone(),
            });
        }
        (Some(connector), true) if !known_connectors.contains(connector) => {
            return Err(DeclarationError::UnknownConnectorType {
                implementation: decl.id.clone(),
                connector: connector.clone(),
            });
        }
        _ => {}
    }

    Ok(Binding {
        implementation: decl.id.clone(),
        contract: decl.contract.clone(),
        kind,
        connector: decl.connector.clone(),
        factory: decl.factory,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declaration::ContractDeclaration;
    use crate::error::{BoxError, CoreError};
    use crate::hierarchy::HierarchyBuilder;
    use crate::plugin::{PluginContext, PluginObject};

    fn noop(_: &PluginContext) -> Result<PluginObject, BoxError> {
        Err("not constructible".into())
    }

    fn hierarchy() -> Arc<ContractHierarchy> {
        let mut builder = HierarchyBuilder::new();
        builder
            .insert(ContractDeclaration::new("Input", ContractKind::Input))
            .unwrap()
            .insert(ContractDeclaration::new("ChatInput", ContractKind::Input).with_parent("Input"))
            .unwrap()
            .insert(ContractDeclaration::new("Requirement", ContractKind::Requirement))
            .unwrap()
            .insert(
                ContractDeclaration::new("ChatRequirement", ContractKind::Requirement)
                    .with_parent("Requirement"),
            )
            .unwrap();
        builder.build().unwrap()
    }

    fn connectors() -> Vec<ConnectorTypeDeclaration> {
        vec![ConnectorTypeDeclaration::new("TwitchConnector")]
    }

    fn bind(decls: Vec<ImplementationDeclaration>) -> CoreResult<BindingTable> {
        BindingTable::bind(&decls, hierarchy(), &connectors())
    }

    fn declaration_error(result: CoreResult<BindingTable>) -> DeclarationError {
        match result {
            Err(CoreError::Declaration(e)) => e,
            other => panic!("expected declaration error, got {other:?}"),
        }
    }

    #[test]
    fn test_bind_and_query() {
        let table = bind(vec![
            ImplementationDeclaration::new("TwitchChatInputImpl", "ChatInput", noop),
            ImplementationDeclaration::new("GenericInputImpl", "Input", noop),
            ImplementationDeclaration::new("TwitchChatRequirementImpl", "ChatRequirement", noop)
                .with_connector("TwitchConnector"),
        ])
        .unwrap();

        assert_eq!(table.len(), 3);
        let binding = table.get("ChatInput", "TwitchChatInputImpl").unwrap();
        assert_eq!(binding.kind(), ContractKind::Input);
        assert!(binding.connector_type().is_none());

        assert!(table.get("Input", "TwitchChatInputImpl").is_none());
        assert_eq!(table.implementations_of("Input").len(), 1);
        assert_eq!(table.satisfying("Input").len(), 2);

        let req = table.find_implementation("TwitchChatRequirementImpl").unwrap();
        assert_eq!(req.connector_type().unwrap(), "TwitchConnector");
    }

    #[test]
    fn test_unknown_contract() {
        let err = declaration_error(bind(vec![ImplementationDeclaration::new(
            "X", "Nope", noop,
        )]));
        assert!(matches!(err, DeclarationError::UnknownContract { .. }));
    }

    #[test]
    fn test_requirement_needs_connector() {
        for contract in ["Requirement", "ChatRequirement"] {
            let err = declaration_error(bind(vec![ImplementationDeclaration::new(
                "NoConnectorImpl",
                contract,
                noop,
            )]));
            assert!(matches!(
                err,
                DeclarationError::MissingConnectorDeclaration { .. }
            ));
        }
    }

    #[test]
    fn test_input_rejects_connector() {
        let err = declaration_error(bind(vec![
            ImplementationDeclaration::new("X", "ChatInput", noop)
                .with_connector("TwitchConnector"),
        ]));
        assert!(matches!(
            err,
            DeclarationError::ConnectorNotAllowed {
                kind: ContractKind::Input,
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_connector_type() {
        let err = declaration_error(bind(vec![
            ImplementationDeclaration::new("X", "ChatRequirement", noop)
                .with_connector("DiscordConnector"),
        ]));
        assert!(matches!(err, DeclarationError::UnknownConnectorType { .. }));
    }

    #[test]
    fn test_duplicate_binding() {
        let err = declaration_error(bind(vec![
            ImplementationDeclaration::new("Dup", "ChatInput", noop),
            ImplementationDeclaration::new("Dup", "ChatInput", noop),
        ]));
        assert!(matches!(err, DeclarationError::DuplicateBinding { .. }));
    }
}
