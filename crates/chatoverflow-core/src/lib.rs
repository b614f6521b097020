//! # ChatOverflow Core
//!
//! Discovery, resolution and instantiation engine for ChatOverflow plugins.
//!
//! Plugins implement abstract *contracts* of three kinds (input, output,
//! requirement).  Requirement implementations need a live *connector*
//! (e.g. a chat platform session) injected when they are constructed.
//!
//! ## Startup Sequence
//!
//! Components run in dependency order; everything but the connector registry
//! is immutable once built.
//!
//! ```text
//! ┌──────────────────┐   freeze   ┌───────────────────┐   build   ┌──────────────┐
//! │ MetadataRegistry │──────────▶│ HierarchyBuilder  │─────────▶│ BindingTable │
//! └──────────────────┘            └───────────────────┘           └──────┬───────┘
//!                                                                        │
//!                        ┌───────────────────┐                 ┌─────────▼──────────┐
//!                        │ ConnectorRegistry │────────────────▶│ PluginInstantiator │
//!                        │     (mutable)     │                 └────────────────────┘
//!                        └───────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use chatoverflow_core::*;
//!
//! let mut registry = MetadataRegistry::new();
//! registry.register(ContractDeclaration::new("Input", ContractKind::Input))?;
//! registry.register(ContractDeclaration::new("ChatInput", ContractKind::Input).with_parent("Input"))?;
//! registry.register(ImplementationDeclaration::new(
//!     "TwitchChatInputImpl",
//!     "ChatInput",
//!     plugin_factory!(TwitchChatInputImpl => dyn ChatInput),
//! ))?;
//! registry.freeze();
//!
//! let hierarchy = HierarchyBuilder::from_registry(&registry)?.build()?;
//! let bindings = BindingTable::from_registry(&registry, &hierarchy)?;
//! let instantiator = PluginInstantiator::new(Arc::new(bindings), Arc::new(ConnectorRegistry::new()));
//!
//! let plugin = instantiator.instantiate("ChatInput", "TwitchChatInputImpl", None).await?;
//! let input = plugin.as_contract::<dyn ChatInput>().unwrap();
//! ```

pub mod binding;
pub mod connector;
pub mod declaration;
pub mod error;
pub mod hierarchy;
pub mod instantiator;
pub mod metadata;
pub mod plugin;
pub mod types;

pub use binding::{Binding, BindingTable};
pub use connector::{
    AsAnyArc, Connector, ConnectorHandle, ConnectorRegistry, ConnectorReservation, ConnectorState,
    ConnectorStats,
};
pub use declaration::{
    ConnectorTypeDeclaration, ContractDeclaration, DECLARATIONS, Declaration,
    ImplementationDeclaration,
};
pub use error::{
    BoxError, CoreError, CoreResult, DeclarationError, ErrorCategory, LookupError, StateError,
};
pub use hierarchy::{Ancestors, BuildPhase, ContractHierarchy, ContractNode, HierarchyBuilder};
pub use instantiator::PluginInstantiator;
pub use metadata::MetadataRegistry;
pub use plugin::{
    ConnectorMeta, ContractMeta, ImplementationMeta, Plugin, PluginContext, PluginFactory,
    PluginInstance, PluginObject,
};
pub use types::{ConnectorKey, ConnectorTypeId, ContractId, ContractKind, ImplementationId};

// Used by code generated in `chatoverflow-macros`.
#[doc(hidden)]
pub use async_trait;
#[doc(hidden)]
pub use linkme;

/// Prelude for common imports.
pub mod prelude {
    pub use super::{
        BoxError, Connector, ConnectorHandle, ConnectorMeta, ContractKind, ContractMeta,
        CoreError, CoreResult, ImplementationMeta, Plugin, PluginContext, PluginInstance,
    };
}
