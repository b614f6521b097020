//! Plugin authoring surface.
//!
//! A plugin is a concrete type implementing one contract trait.  The core
//! never inspects types at runtime; instead each implementation is paired
//! with a [`PluginFactory`] that constructs it from a [`PluginContext`] and
//! returns a type-erased [`PluginObject`].
//!
//! ```rust,ignore
//! struct TwitchChatInputImpl { channel: String }
//!
//! impl ChatInput for TwitchChatInputImpl { /* … */ }
//!
//! impl Plugin for TwitchChatInputImpl {
//!     fn create(ctx: &PluginContext) -> Result<Self, BoxError> {
//!         let cfg: ChannelConfig = ctx.config()?;
//!         Ok(Self { channel: cfg.channel })
//!     }
//! }
//!
//! let factory = plugin_factory!(TwitchChatInputImpl => dyn ChatInput);
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::connector::{Connector, ConnectorHandle};
use crate::error::BoxError;
use crate::types::{ConnectorTypeId, ContractId, ContractKind, ImplementationId};

// =============================================================================
// Static metadata traits
// =============================================================================

/// Static metadata of a contract.
///
/// Implemented for the trait-object type of a contract trait
/// (`impl ContractMeta for dyn ChatInput`), usually by `#[contract]`.
pub trait ContractMeta {
    /// Contract identifier.
    const ID: &'static str;
    /// Contract kind.
    const KIND: ContractKind;
    /// Parent contract identifier, if any.
    const PARENT: Option<&'static str>;
}

/// Static metadata of a concrete implementation, usually generated by
/// `#[implementation]`.
pub trait ImplementationMeta: Plugin {
    /// Implementation identifier.
    const ID: &'static str;
    /// Identifier of the implemented contract.
    const CONTRACT: &'static str;
    /// Required connector type, if any.
    const CONNECTOR: Option<&'static str>;
}

/// Static metadata of a connector type, usually generated by `#[connector]`.
pub trait ConnectorMeta {
    /// Connector type identifier.
    const ID: &'static str;

    /// Returns [`ID`](Self::ID) as a [`ConnectorTypeId`].
    fn connector_type_id() -> ConnectorTypeId {
        ConnectorTypeId::from_static(Self::ID)
    }
}

// =============================================================================
// Plugin
// =============================================================================

/// A constructible plugin implementation.
pub trait Plugin: Sized + Send + Sync + 'static {
    /// Builds the plugin.
    ///
    /// Errors are surfaced to the caller of the instantiator wrapped in
    /// [`CoreError::Instantiation`](crate::CoreError::Instantiation).
    fn create(ctx: &PluginContext) -> Result<Self, BoxError>;
}

/// Factory function stored in an implementation declaration.
pub type PluginFactory = fn(&PluginContext) -> Result<PluginObject, BoxError>;

/// Builds a [`PluginFactory`] for `Impl` exposed through the `Contract` view.
///
/// ```rust,ignore
/// let factory: PluginFactory = plugin_factory!(TwitchChatInputImpl => dyn ChatInput);
/// ```
#[macro_export]
macro_rules! plugin_factory {
    ($impl:ty => $contract:ty) => {{
        fn __chatoverflow_factory(
            ctx: &$crate::PluginContext,
        ) -> ::std::result::Result<$crate::PluginObject, $crate::BoxError> {
            let concrete = ::std::sync::Arc::new(<$impl as $crate::Plugin>::create(ctx)?);
            let view: ::std::sync::Arc<$contract> = concrete.clone();
            ::std::result::Result::Ok($crate::PluginObject::new(concrete, view))
        }
        __chatoverflow_factory as $crate::PluginFactory
    }};
}

// =============================================================================
// PluginContext
// =============================================================================

/// Everything a plugin constructor may use.
#[derive(Clone)]
pub struct PluginContext {
    implementation: ImplementationId,
    contract: ContractId,
    connector: Option<ConnectorHandle>,
    config: Arc<serde_json::Value>,
}

impl PluginContext {
    /// Creates a context for the given implementation.
    pub fn new(
        implementation: ImplementationId,
        contract: ContractId,
        connector: Option<ConnectorHandle>,
        config: Arc<serde_json::Value>,
    ) -> Self {
        Self {
            implementation,
            contract,
            connector,
            config,
        }
    }

    /// Identifier of the implementation being built.
    pub fn implementation(&self) -> &ImplementationId {
        &self.implementation
    }

    /// Identifier of the contract it is built for.
    pub fn contract(&self) -> &ContractId {
        &self.contract
    }

    /// The injected connector handle, if the contract is a requirement.
    pub fn connector_handle(&self) -> Option<&ConnectorHandle> {
        self.connector.as_ref()
    }

    /// Returns the injected connector as its concrete type.
    ///
    /// Fails when no connector was injected or it is of another type.
    pub fn connector<T: Connector>(&self) -> Result<Arc<T>, BoxError> {
        let handle = self.connector.as_ref().ok_or_else(|| {
            format!("no connector injected into '{}'", self.implementation)
        })?;
        handle.downcast::<T>().ok_or_else(|| {
            format!(
                "connector '{}' injected into '{}' is not a {}",
                handle.key(),
                self.implementation,
                std::any::type_name::<T>()
            )
            .into()
        })
    }

    /// Raw plugin configuration section (an empty object when absent).
    pub fn raw_config(&self) -> &serde_json::Value {
        &self.config
    }

    /// Deserializes the plugin configuration section into `T`.
    ///
    /// Use `#[serde(default)]` on `T` to make every field optional.
    pub fn config<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        T::deserialize(self.config.as_ref())
    }
}

impl fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginContext")
            .field("implementation", &self.implementation)
            .field("contract", &self.contract)
            .field("connector", &self.connector.as_ref().map(ConnectorHandle::key))
            .finish()
    }
}

// =============================================================================
// PluginObject / PluginInstance
// =============================================================================

/// A type-erased plugin value.
///
/// Holds the concrete `Arc<T>` and, separately, the contract view
/// `Arc<dyn Contract>` so both can be recovered without knowing the other.
#[derive(Clone)]
pub struct PluginObject {
    concrete: Arc<dyn Any + Send + Sync>,
    view: Arc<dyn Any + Send + Sync>,
}

impl PluginObject {
    /// Wraps a constructed plugin and its contract view.
    pub fn new<T, C>(concrete: Arc<T>, view: Arc<C>) -> Self
    where
        T: Send + Sync + 'static,
        C: ?Sized + Send + Sync + 'static,
    {
        Self {
            concrete,
            view: Arc::new(view),
        }
    }

    /// Returns the concrete plugin if it is a `T`.
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.concrete).downcast::<T>().ok()
    }

    /// Returns the contract view if it was stored as `Arc<C>`.
    pub fn view<C: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<C>> {
        self.view.downcast_ref::<Arc<C>>().cloned()
    }
}

/// A constructed plugin together with its binding information.
#[derive(Clone)]
pub struct PluginInstance {
    implementation: ImplementationId,
    contract: ContractId,
    connector: Option<ConnectorHandle>,
    object: PluginObject,
}

impl PluginInstance {
    pub(crate) fn new(
        implementation: ImplementationId,
        contract: ContractId,
        connector: Option<ConnectorHandle>,
        object: PluginObject,
    ) -> Self {
        Self {
            implementation,
            contract,
            connector,
            object,
        }
    }

    /// Identifier of the implementation.
    pub fn implementation(&self) -> &ImplementationId {
        &self.implementation
    }

    /// Identifier of the contract.
    pub fn contract(&self) -> &ContractId {
        &self.contract
    }

    /// The injected connector, if any.
    pub fn connector(&self) -> Option<&ConnectorHandle> {
        self.connector.as_ref()
    }

    /// Returns the concrete plugin if it is a `T`.
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.object.downcast::<T>()
    }

    /// Returns the plugin as its contract trait object, e.g.
    /// `instance.as_contract::<dyn ChatInput>()`.
    pub fn as_contract<C: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<C>> {
        self.object.view::<C>()
    }
}

impl fmt::Debug for PluginInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginInstance")
            .field("implementation", &self.implementation)
            .field("contract", &self.contract)
            .field("connector", &self.connector.as_ref().map(ConnectorHandle::key))
            .finish()
    }
}
