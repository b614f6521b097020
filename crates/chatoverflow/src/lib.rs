//! # ChatOverflow
//!
//! Plugin framework core for ChatOverflow.
//!
//! ## Overview
//!
//! Plugins implement abstract *contracts*. Every contract is an input,
//! output or requirement, and contracts of one kind form a forest. A
//! requirement implementation talks to an external platform through a
//! *connector*, which is looked up by `(connector type, key)` and injected
//! when the plugin is built.
//!
//! ```text
//! ┌──────────────┐ declarations ┌─────────────────┐ instantiate ┌──────────────────┐
//! │ #[contract]  │─────────────▶│ OverflowRuntime │────────────▶│ Arc<dyn Contract>│
//! │ #[connector] │              │   (startup)     │             └──────────────────┘
//! │ #[impl...]   │              └───────▲─────────┘
//! └──────────────┘                      │ connectors
//!                             ┌─────────┴─────────┐
//!                             │ ConnectorProvider │
//!                             └───────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chatoverflow::prelude::*;
//!
//! #[contract(input)]
//! pub trait Input {}
//!
//! #[contract(input, parent = Input)]
//! pub trait ChatInput {
//!     fn channel(&self) -> String;
//! }
//!
//! pub struct TwitchChatInputImpl { channel: String }
//!
//! impl Plugin for TwitchChatInputImpl {
//!     fn create(ctx: &PluginContext) -> Result<Self, BoxError> {
//!         Ok(Self { channel: ctx.raw_config()["channel"].as_str().unwrap_or("lobby").into() })
//!     }
//! }
//!
//! #[implementation]
//! impl ChatInput for TwitchChatInputImpl {
//!     fn channel(&self) -> String { self.channel.clone() }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = OverflowRuntime::builder().build()?;
//!     runtime.startup().await?;
//!
//!     let plugin = runtime.instantiate_impl::<TwitchChatInputImpl>(None).await?;
//!     let input = plugin.as_contract::<dyn ChatInput>().unwrap();
//!     println!("reading {}", input.channel());
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: load `chatoverflow.toml` (default)
//! - `yaml-config`: load `chatoverflow.yaml`
//! - `json-log`: JSON log output

pub use chatoverflow_core as core;
pub use chatoverflow_runtime as runtime;

pub use chatoverflow_core::{
    Binding, BindingTable, BoxError, BuildPhase, Connector, ConnectorHandle, ConnectorKey,
    ConnectorRegistry, ConnectorReservation, ConnectorState, ConnectorTypeDeclaration,
    ConnectorTypeId, ContractDeclaration, ContractHierarchy, ContractId, ContractKind, CoreError,
    CoreResult, Declaration, DeclarationError, ErrorCategory, HierarchyBuilder,
    ImplementationDeclaration, ImplementationId, LookupError, MetadataRegistry, PluginContext,
    PluginInstance, PluginInstantiator, StateError, plugin_factory,
};
pub use chatoverflow_macros::{connector, contract, implementation};
pub use chatoverflow_runtime::{
    ConnectorProvider, OverflowConfig, OverflowRuntime, RuntimeError, RuntimeResult,
};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use chatoverflow::prelude::*;
/// ```
pub mod prelude {
    // Declarative markers
    pub use chatoverflow_macros::{connector, contract, implementation};

    // Plugin authoring
    pub use chatoverflow_core::{
        BoxError, Connector, ConnectorMeta, ConnectorTypeId, ContractMeta, ImplementationMeta,
        Plugin, PluginContext, PluginInstance,
    };

    // Host side
    pub use chatoverflow_runtime::{ConnectorProvider, OverflowRuntime, RuntimeError};

    // `#[async_trait]` for `Connector` and `ConnectorProvider` impls
    pub use chatoverflow_core::async_trait::async_trait;
}

// Paths used by code generated in `chatoverflow-macros`.
#[doc(hidden)]
pub mod __private {
    pub use chatoverflow_core::linkme;
    pub use chatoverflow_core::plugin_factory;
    pub use chatoverflow_core::{
        ConnectorMeta, ConnectorTypeDeclaration, ConnectorTypeId, ContractDeclaration, ContractId,
        ContractKind, ContractMeta, DECLARATIONS, Declaration, ImplementationDeclaration,
        ImplementationId, ImplementationMeta,
    };
}
