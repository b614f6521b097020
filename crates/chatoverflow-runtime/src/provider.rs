//! Connector providers.
//!
//! The core never opens connections itself. A provider turns the `settings`
//! table of a configured connector into a live [`Connector`], which the
//! runtime then adds to the [`ConnectorRegistry`](chatoverflow_core::ConnectorRegistry).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chatoverflow_core::{BoxError, Connector, ConnectorTypeId};
use tracing::{debug, warn};

/// Establishes connectors of one connector type.
///
/// ```rust,ignore
/// struct TwitchProvider;
///
/// #[async_trait]
/// impl ConnectorProvider for TwitchProvider {
///     fn connector_type(&self) -> ConnectorTypeId {
///         ConnectorTypeId::from_static(<TwitchConnector as ConnectorMeta>::ID)
///     }
///
///     async fn connect(&self, key: &str, settings: &Value) -> Result<Arc<dyn Connector>, BoxError> {
///         let oauth = settings["oauth"].as_str().ok_or("missing oauth token")?;
///         Ok(Arc::new(TwitchConnector::login(key, oauth).await?))
///     }
/// }
/// ```
#[async_trait]
pub trait ConnectorProvider: Send + Sync {
    /// The connector type this provider produces.
    fn connector_type(&self) -> ConnectorTypeId;

    /// Opens the connector for `key` using its configured `settings`.
    async fn connect(
        &self,
        key: &str,
        settings: &serde_json::Value,
    ) -> Result<Arc<dyn Connector>, BoxError>;
}

/// Providers indexed by connector type.
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<ConnectorTypeId, Arc<dyn ConnectorProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `provider`, replacing any provider of the same type.
    pub fn register(&mut self, provider: Arc<dyn ConnectorProvider>) {
        let connector_type = provider.connector_type();
        if self
            .providers
            .insert(connector_type.clone(), provider)
            .is_some()
        {
            warn!(connector_type = %connector_type, "Replaced connector provider");
        } else {
            debug!(connector_type = %connector_type, "Registered connector provider");
        }
    }

    pub fn get(&self, connector_type: &str) -> Option<&Arc<dyn ConnectorProvider>> {
        self.providers.get(connector_type)
    }

    /// Connector types with a provider, sorted.
    pub fn connector_types(&self) -> Vec<&ConnectorTypeId> {
        let mut types: Vec<_> = self.providers.keys().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("connector_types", &self.connector_types())
            .finish()
    }
}
