//! On-demand plugin construction.

use std::sync::Arc;

use tracing::{debug, info};

use crate::binding::{Binding, BindingTable};
use crate::connector::{ConnectorHandle, ConnectorRegistry};
use crate::error::{CoreError, CoreResult, LookupError};
use crate::plugin::{ImplementationMeta, PluginContext, PluginInstance};

/// Creates plugin instances from the binding table, injecting connectors
/// from the live registry.
///
/// Cheap to clone; clones share the table and the registry.
#[derive(Debug, Clone)]
pub struct PluginInstantiator {
    bindings: Arc<BindingTable>,
    connectors: Arc<ConnectorRegistry>,
}

impl PluginInstantiator {
    pub fn new(bindings: Arc<BindingTable>, connectors: Arc<ConnectorRegistry>) -> Self {
        Self {
            bindings,
            connectors,
        }
    }

    pub fn bindings(&self) -> &Arc<BindingTable> {
        &self.bindings
    }

    pub fn connectors(&self) -> &Arc<ConnectorRegistry> {
        &self.connectors
    }

    /// Instantiates `implementation` for `contract` with an empty configuration.
    ///
    /// # Errors
    ///
    /// - [`LookupError::UnknownImplementation`] if the pair is not bound
    /// - [`LookupError::MissingConnectorKey`] if a connector is needed but `connector_key` is `None`
    /// - [`LookupError::ConnectorNotFound`] if no connector is registered under the key
    /// - [`CoreError::Instantiation`] if the plugin constructor fails
    pub async fn instantiate(
        &self,
        contract: &str,
        implementation: &str,
        connector_key: Option<&str>,
    ) -> CoreResult<PluginInstance> {
        self.instantiate_with_config(
            contract,
            implementation,
            connector_key,
            serde_json::Value::Object(Default::default()),
        )
        .await
    }

    /// Like [`instantiate`](Self::instantiate), passing `config` to the plugin
    /// through [`PluginContext::config`].
    pub async fn instantiate_with_config(
        &self,
        contract: &str,
        implementation: &str,
        connector_key: Option<&str>,
        config: serde_json::Value,
    ) -> CoreResult<PluginInstance> {
        let binding = self.bindings.get(contract, implementation).ok_or_else(|| {
            LookupError::UnknownImplementation {
                contract: contract.to_owned().into(),
                implementation: implementation.to_owned().into(),
            }
        })?;

        let connector = self.resolve_connector(binding, connector_key).await?;
        let ctx = PluginContext::new(
            binding.implementation().clone(),
            binding.contract().clone(),
            connector.clone(),
            Arc::new(config),
        );

        let object = (binding.factory())(&ctx).map_err(|source| CoreError::Instantiation {
            implementation: binding.implementation().clone(),
            source,
        })?;

        info!(
            implementation = %binding.implementation(),
            contract = %binding.contract(),
            connector = ?connector.as_ref().map(ConnectorHandle::key),
            "Plugin instantiated"
        );
        Ok(PluginInstance::new(
            binding.implementation().clone(),
            binding.contract().clone(),
            connector,
            object,
        ))
    }

    /// Instantiates `T` using the identifiers of its [`ImplementationMeta`].
    pub async fn instantiate_impl<T: ImplementationMeta>(
        &self,
        connector_key: Option<&str>,
    ) -> CoreResult<PluginInstance> {
        self.instantiate(T::CONTRACT, T::ID, connector_key).await
    }

    async fn resolve_connector(
        &self,
        binding: &Binding,
        connector_key: Option<&str>,
    ) -> CoreResult<Option<ConnectorHandle>> {
        let Some(connector_type) = binding.connector_type() else {
            if let Some(key) = connector_key {
                debug!(
                    implementation = %binding.implementation(),
                    key,
                    "Ignoring connector key for implementation without connector"
                );
            }
            return Ok(None);
        };

        let key = connector_key.ok_or_else(|| LookupError::MissingConnectorKey {
            implementation: binding.implementation().clone(),
            connector_type: connector_type.clone(),
        })?;

        let handle = self.connectors.get_connector(connector_type, key).await?;
        Ok(Some(handle))
    }
}
