//! Host runtime: runs the startup sequence and owns the live connectors.
//!
//! ```rust,ignore
//! use chatoverflow_runtime::OverflowRuntime;
//!
//! let runtime = OverflowRuntime::builder()
//!     .config_file("chatoverflow.toml")
//!     .provider(TwitchProvider::new())
//!     .build()?;
//!
//! runtime.startup().await?;
//! let plugin = runtime
//!     .instantiate("ChatRequirement", "TwitchChatRequirementImpl", Some("acct1"))
//!     .await?;
//! ```

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use chatoverflow_core::{
    BindingTable, ConnectorHandle, ConnectorRegistry, ConnectorStats, ConnectorTypeId,
    ContractHierarchy, Declaration, HierarchyBuilder, ImplementationMeta, MetadataRegistry,
    PluginInstance, PluginInstantiator,
};
use futures::future;
use parking_lot::RwLock;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn};

use crate::config::{ConfigLoader, OverflowConfig, validate_config};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;
use crate::provider::{ConnectorProvider, ProviderRegistry};

/// Immutable state produced by a successful startup.
#[derive(Clone)]
struct Engine {
    hierarchy: Arc<ContractHierarchy>,
    bindings: Arc<BindingTable>,
    instantiator: PluginInstantiator,
}

/// The ChatOverflow host runtime.
///
/// Lifecycle: [`build`](RuntimeBuilder::build) → [`startup`](Self::startup)
/// → plugin instantiation → [`shutdown`](Self::shutdown).
pub struct OverflowRuntime {
    config: OverflowConfig,
    declarations: Vec<Declaration>,
    load_declared: bool,
    providers: ProviderRegistry,
    connectors: Arc<ConnectorRegistry>,
    engine: RwLock<Option<Engine>>,
    shutdown: CancellationToken,
}

impl OverflowRuntime {
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    pub fn config(&self) -> &OverflowConfig {
        &self.config
    }

    /// The live connector registry.
    pub fn connectors(&self) -> &Arc<ConnectorRegistry> {
        &self.connectors
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn is_started(&self) -> bool {
        self.engine.read().is_some()
    }

    /// Token cancelled by [`shutdown`](Self::shutdown); cancelling it stops
    /// [`run_until`](Self::run_until).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn hierarchy(&self) -> RuntimeResult<Arc<ContractHierarchy>> {
        Ok(Arc::clone(&self.engine()?.hierarchy))
    }

    pub fn bindings(&self) -> RuntimeResult<Arc<BindingTable>> {
        Ok(Arc::clone(&self.engine()?.bindings))
    }

    fn engine(&self) -> RuntimeResult<Engine> {
        self.engine.read().clone().ok_or(RuntimeError::NotStarted)
    }

    // =========================================================================
    // Startup
    // =========================================================================

    /// Resolves all declarations, then establishes the configured connectors.
    ///
    /// Declaration errors abort startup and leave the runtime unstarted.
    /// Connector failures are logged and skipped; a later lookup of such a
    /// connector fails with `ConnectorNotFound`.
    pub async fn startup(&self) -> RuntimeResult<()> {
        {
            let mut slot = self.engine.write();
            if slot.is_some() {
                return Err(RuntimeError::AlreadyStarted);
            }
            *slot = Some(self.resolve()?);
        }

        let connected = self.connect_configured().await;
        info!(connectors = connected, "Runtime started");
        Ok(())
    }

    fn resolve(&self) -> RuntimeResult<Engine> {
        let _span = info_span!("resolve").entered();

        let mut registry = MetadataRegistry::new();
        if self.load_declared {
            let count = registry.register_declared()?;
            debug!(count, "Registered link-time declarations");
        }
        registry.register_all(self.declarations.iter().cloned())?;
        registry.freeze();

        let hierarchy = HierarchyBuilder::from_registry(&registry)?.build()?;
        let bindings = Arc::new(BindingTable::from_registry(&registry, &hierarchy)?);
        let instantiator =
            PluginInstantiator::new(Arc::clone(&bindings), Arc::clone(&self.connectors));

        info!(
            contracts = hierarchy.len(),
            implementations = bindings.len(),
            connector_types = registry.connector_types().len(),
            "Plugin declarations resolved"
        );

        Ok(Engine {
            hierarchy,
            bindings,
            instantiator,
        })
    }

    /// Establishes every enabled connector concurrently.
    async fn connect_configured(&self) -> usize {
        let attempts = self.config.enabled_connectors().map(|cfg| async move {
            let result = self
                .establish(&cfg.connector_type, &cfg.key, &cfg.settings)
                .await;
            if let Err(e) = &result {
                warn!(
                    connector_type = %cfg.connector_type,
                    key = %cfg.key,
                    error = %e,
                    "Skipping connector"
                );
            }
            result.is_ok()
        });

        let results = future::join_all(attempts).await;
        let disabled = self.config.connectors.len() - results.len();
        if disabled > 0 {
            debug!(disabled, "Disabled connectors not established");
        }
        results.into_iter().filter(|ok| *ok).count()
    }

    // =========================================================================
    // Connectors
    // =========================================================================

    /// Establishes a connector through its provider and registers it.
    pub async fn connect(
        &self,
        connector_type: &str,
        key: &str,
        settings: &serde_json::Value,
    ) -> RuntimeResult<ConnectorHandle> {
        self.engine()?;
        self.establish(connector_type, key, settings).await
    }

    async fn establish(
        &self,
        connector_type: &str,
        key: &str,
        settings: &serde_json::Value,
    ) -> RuntimeResult<ConnectorHandle> {
        let provider = self
            .providers
            .get(connector_type)
            .ok_or_else(|| RuntimeError::NoProvider {
                connector_type: ConnectorTypeId::new(connector_type),
            })?;

        // The key stays reserved while the provider connects, so a concurrent
        // `connect` on it waits and then fails as a duplicate.
        let reservation = self
            .connectors
            .reserve(provider.connector_type(), key)
            .await?;

        let connector = provider
            .connect(key, settings)
            .await
            .map_err(|source| RuntimeError::Provider {
                key: reservation.key().clone(),
                source,
            })?;

        match reservation.complete(Arc::clone(&connector)) {
            Ok(handle) => Ok(handle),
            Err(e) => {
                if let Err(hook) = connector.disconnect().await {
                    warn!(key, error = %hook, "Disconnect of rejected connector failed");
                }
                Err(e.into())
            }
        }
    }

    /// Disconnects and removes a connector.
    pub async fn disconnect(
        &self,
        connector_type: &str,
        key: &str,
    ) -> RuntimeResult<ConnectorHandle> {
        Ok(self
            .connectors
            .remove_connector(&ConnectorTypeId::new(connector_type), key)
            .await?)
    }

    // =========================================================================
    // Plugins
    // =========================================================================

    /// Instantiates `implementation` of `contract`.
    ///
    /// The plugin receives the `plugins.<implementation>` configuration section.
    pub async fn instantiate(
        &self,
        contract: &str,
        implementation: &str,
        connector_key: Option<&str>,
    ) -> RuntimeResult<PluginInstance> {
        let engine = self.engine()?;
        let config = self.config.plugin_section(implementation);
        Ok(engine
            .instantiator
            .instantiate_with_config(contract, implementation, connector_key, config)
            .await?)
    }

    /// Instantiates `T` using its static metadata.
    pub async fn instantiate_impl<T: ImplementationMeta>(
        &self,
        connector_key: Option<&str>,
    ) -> RuntimeResult<PluginInstance> {
        self.instantiate(T::CONTRACT, T::ID, connector_key).await
    }

    // =========================================================================
    // Shutdown
    // =========================================================================

    /// Disconnects every connector and cancels the shutdown token.
    ///
    /// Returns the number of connectors removed. Safe to call repeatedly.
    pub async fn shutdown(&self) -> usize {
        self.shutdown.cancel();
        let removed = self.connectors.remove_all().await;
        info!(removed, "Runtime stopped");
        removed
    }

    /// Starts (if needed), waits for `shutdown_signal` or the shutdown token,
    /// then shuts down.
    pub async fn run_until<F>(&self, shutdown_signal: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        if !self.is_started() {
            self.startup().await?;
        }

        tokio::select! {
            _ = shutdown_signal => debug!("Shutdown signal received"),
            _ = self.shutdown.cancelled() => debug!("Shutdown token cancelled"),
        }

        self.shutdown().await;
        Ok(())
    }

    /// Runs until Ctrl+C (or SIGTERM on unix).
    pub async fn run(&self) -> RuntimeResult<()> {
        info!("ChatOverflow runtime is running. Press Ctrl+C to stop.");
        self.run_until(wait_for_signal()).await
    }

    pub async fn stats(&self) -> RuntimeStats {
        let engine = self.engine.read().clone();
        RuntimeStats {
            started: engine.is_some(),
            contracts: engine.as_ref().map_or(0, |e| e.hierarchy.len()),
            implementations: engine.as_ref().map_or(0, |e| e.bindings.len()),
            providers: self.providers.len(),
            connectors: self.connectors.stats().await,
        }
    }
}

impl fmt::Debug for OverflowRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverflowRuntime")
            .field("started", &self.is_started())
            .field("providers", &self.providers)
            .field("connectors", &self.connectors)
            .finish_non_exhaustive()
    }
}

async fn wait_for_signal() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl+C, shutting down"),
    }
}

/// Snapshot of runtime counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub started: bool,
    pub contracts: usize,
    pub implementations: usize,
    pub providers: usize,
    pub connectors: ConnectorStats,
}

impl fmt::Display for RuntimeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} contracts, {} implementations, {} providers; {}",
            self.contracts, self.implementations, self.providers, self.connectors
        )
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for [`OverflowRuntime`].
///
/// ```rust,ignore
/// let runtime = OverflowRuntime::builder()
///     .profile("production")
///     .declaration(ContractDeclaration::new("Input", ContractKind::Input))
///     .provider(TwitchProvider::new())
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
    config: Option<OverflowConfig>,
    declarations: Vec<Declaration>,
    load_declared: bool,
    providers: ProviderRegistry,
    init_logging: bool,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeBuilder {
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new(),
            config: None,
            declarations: Vec::new(),
            load_declared: true,
            providers: ProviderRegistry::new(),
            init_logging: true,
        }
    }

    pub fn config_file(mut self, path: impl AsRef<Path>) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    pub fn search_path(mut self, path: impl AsRef<Path>) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    pub fn with_env(mut self) -> Self {
        self.config_loader = self.config_loader.with_env();
        self
    }

    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges `config` over the loaded sources.
    pub fn merge(mut self, config: OverflowConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Uses `config` as is, skipping file and environment loading.
    pub fn config(mut self, config: OverflowConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Adds a declaration registered at startup.
    pub fn declaration(mut self, declaration: impl Into<Declaration>) -> Self {
        self.declarations.push(declaration.into());
        self
    }

    pub fn declarations<I>(mut self, declarations: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Declaration>,
    {
        self.declarations
            .extend(declarations.into_iter().map(Into::into));
        self
    }

    /// Ignores declarations collected from `#[contract]`, `#[implementation]`
    /// and `#[connector]`.
    pub fn without_declared(mut self) -> Self {
        self.load_declared = false;
        self
    }

    pub fn provider(mut self, provider: impl ConnectorProvider + 'static) -> Self {
        self.providers.register(Arc::new(provider));
        self
    }

    /// Leaves the global tracing subscriber untouched.
    pub fn without_logging(mut self) -> Self {
        self.init_logging = false;
        self
    }

    pub fn build(self) -> RuntimeResult<OverflowRuntime> {
        let config = match self.config {
            Some(config) => {
                validate_config(&config)?;
                config
            }
            None => self.config_loader.load()?,
        };

        if self.init_logging {
            logging::init_from_config(&config.logging);
        }

        debug!(
            declarations = self.declarations.len(),
            providers = self.providers.len(),
            "Runtime built"
        );

        Ok(OverflowRuntime {
            config,
            declarations: self.declarations,
            load_declared: self.load_declared,
            providers: self.providers,
            connectors: Arc::new(ConnectorRegistry::new()),
            engine: RwLock::new(None),
            shutdown: CancellationToken::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use chatoverflow_core::{
        BoxError, Connector, ConnectorKey, ConnectorTypeDeclaration, ContractDeclaration,
        ContractKind, CoreError, DeclarationError, ImplementationDeclaration, LookupError, Plugin,
        PluginContext, plugin_factory,
    };

    use super::*;
    use crate::config::ConnectorConfig;

    trait ChatInput: Send + Sync {
        fn channel(&self) -> String;
    }

    trait ChatRequirement: Send + Sync {
        fn account(&self) -> String;
    }

    struct TwitchChatInputImpl {
        channel: String,
    }

    impl ChatInput for TwitchChatInputImpl {
        fn channel(&self) -> String {
            self.channel.clone()
        }
    }

    impl Plugin for TwitchChatInputImpl {
        fn create(ctx: &PluginContext) -> Result<Self, BoxError> {
            let channel = ctx.raw_config()["channel"]
                .as_str()
                .unwrap_or("lobby")
                .to_string();
            Ok(Self { channel })
        }
    }

    struct TwitchConnector {
        account: String,
        disconnects: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Connector for TwitchConnector {
        fn connector_type(&self) -> ConnectorTypeId {
            ConnectorTypeId::from("TwitchConnector")
        }

        async fn disconnect(&self) -> Result<(), BoxError> {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct TwitchChatRequirementImpl {
        connector: Arc<TwitchConnector>,
    }

    impl ChatRequirement for TwitchChatRequirementImpl {
        fn account(&self) -> String {
            self.connector.account.clone()
        }
    }

    impl Plugin for TwitchChatRequirementImpl {
        fn create(ctx: &PluginContext) -> Result<Self, BoxError> {
            Ok(Self {
                connector: ctx.connector::<TwitchConnector>()?,
            })
        }
    }

    #[derive(Default)]
    struct TwitchProvider {
        opened: Arc<AtomicUsize>,
        disconnects: Arc<AtomicUsize>,
        delay: Duration,
    }

    #[async_trait]
    impl ConnectorProvider for TwitchProvider {
        fn connector_type(&self) -> ConnectorTypeId {
            ConnectorTypeId::from("TwitchConnector")
        }

        async fn connect(
            &self,
            key: &str,
            settings: &serde_json::Value,
        ) -> Result<Arc<dyn Connector>, BoxError> {
            if settings["oauth"].as_str().is_none() {
                return Err("missing oauth token".into());
            }
            tokio::time::sleep(self.delay).await;
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(TwitchConnector {
                account: key.to_string(),
                disconnects: Arc::clone(&self.disconnects),
            }))
        }
    }

    fn declarations() -> Vec<Declaration> {
        vec![
            ContractDeclaration::new("Input", ContractKind::Input).into(),
            ContractDeclaration::new("ChatInput", ContractKind::Input)
                .with_parent("Input")
                .into(),
            ContractDeclaration::new("Requirement", ContractKind::Requirement).into(),
            ContractDeclaration::new("ChatRequirement", ContractKind::Requirement)
                .with_parent("Requirement")
                .into(),
            ConnectorTypeDeclaration::new("TwitchConnector").into(),
            ImplementationDeclaration::new(
                "TwitchChatInputImpl",
                "ChatInput",
                plugin_factory!(TwitchChatInputImpl => dyn ChatInput),
            )
            .into(),
            ImplementationDeclaration::new(
                "TwitchChatRequirementImpl",
                "ChatRequirement",
                plugin_factory!(TwitchChatRequirementImpl => dyn ChatRequirement),
            )
            .with_connector("TwitchConnector")
            .into(),
        ]
    }

    fn config() -> OverflowConfig {
        let mut config = OverflowConfig {
            connectors: vec![
                ConnectorConfig::new("TwitchConnector", "acct1")
                    .with_settings(serde_json::json!({ "oauth": "oauth:abc" })),
                // Fails in the provider and is skipped.
                ConnectorConfig::new("TwitchConnector", "broken"),
                // No provider and is skipped.
                ConnectorConfig::new("DiscordConnector", "guild"),
            ],
            ..Default::default()
        };
        config.plugins.insert(
            "TwitchChatInputImpl".into(),
            serde_json::json!({ "channel": "speedruns" }),
        );
        config
    }

    fn runtime(provider: TwitchProvider) -> OverflowRuntime {
        OverflowRuntime::builder()
            .config(config())
            .without_declared()
            .without_logging()
            .declarations(declarations())
            .provider(provider)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_startup_connects_configured() {
        let runtime = runtime(TwitchProvider::default());
        assert!(matches!(
            runtime.instantiate("ChatInput", "TwitchChatInputImpl", None).await,
            Err(RuntimeError::NotStarted)
        ));

        runtime.startup().await.unwrap();
        assert!(runtime.is_started());
        assert!(matches!(
            runtime.startup().await,
            Err(RuntimeError::AlreadyStarted)
        ));

        let keys = runtime.connectors().keys().await;
        assert_eq!(keys, vec![ConnectorKey::new("TwitchConnector", "acct1")]);

        let stats = runtime.stats().await;
        assert_eq!(stats.contracts, 4);
        assert_eq!(stats.implementations, 2);
        assert_eq!(stats.connectors.connected, 1);
    }

    #[tokio::test]
    async fn test_instantiate_with_plugin_config() {
        let runtime = runtime(TwitchProvider::default());
        runtime.startup().await.unwrap();

        let input = runtime
            .instantiate("ChatInput", "TwitchChatInputImpl", None)
            .await
            .unwrap();
        assert_eq!(
            input.as_contract::<dyn ChatInput>().unwrap().channel(),
            "speedruns"
        );

        let requirement = runtime
            .instantiate("ChatRequirement", "TwitchChatRequirementImpl", Some("acct1"))
            .await
            .unwrap();
        assert_eq!(
            requirement
                .as_contract::<dyn ChatRequirement>()
                .unwrap()
                .account(),
            "acct1"
        );

        let err = runtime
            .instantiate("ChatRequirement", "TwitchChatRequirementImpl", Some("broken"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Core(CoreError::Lookup(LookupError::ConnectorNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let provider = TwitchProvider::default();
        let disconnects = Arc::clone(&provider.disconnects);
        let runtime = runtime(provider);
        runtime.startup().await.unwrap();

        let settings = serde_json::json!({ "oauth": "oauth:def" });
        runtime
            .connect("TwitchConnector", "acct2", &settings)
            .await
            .unwrap();
        assert!(matches!(
            runtime.connect("TwitchConnector", "acct2", &settings).await,
            Err(RuntimeError::Core(CoreError::Lookup(
                LookupError::DuplicateConnector { .. }
            )))
        ));
        assert!(matches!(
            runtime.connect("DiscordConnector", "guild", &settings).await,
            Err(RuntimeError::NoProvider { .. })
        ));
        assert!(matches!(
            runtime
                .connect("TwitchConnector", "acct3", &serde_json::json!({}))
                .await,
            Err(RuntimeError::Provider { .. })
        ));

        runtime.disconnect("TwitchConnector", "acct2").await.unwrap();
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
        assert!(runtime.disconnect("TwitchConnector", "acct2").await.is_err());

        assert_eq!(runtime.shutdown().await, 1);
        assert_eq!(disconnects.load(Ordering::SeqCst), 2);
        assert!(runtime.connectors().is_empty().await);
    }

    #[tokio::test]
    async fn test_racing_connects_open_one_connection() {
        let provider = TwitchProvider {
            delay: Duration::from_millis(20),
            ..Default::default()
        };
        let opened = Arc::clone(&provider.opened);
        let disconnects = Arc::clone(&provider.disconnects);
        let runtime = runtime(provider);
        runtime.startup().await.unwrap();
        let before = opened.load(Ordering::SeqCst);

        let settings = serde_json::json!({ "oauth": "oauth:def" });
        let (a, b) = tokio::join!(
            runtime.connect("TwitchConnector", "acct2", &settings),
            runtime.connect("TwitchConnector", "acct2", &settings),
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        let rejected = if a.is_err() { a } else { b };
        assert!(matches!(
            rejected,
            Err(RuntimeError::Core(CoreError::Lookup(
                LookupError::DuplicateConnector { .. }
            )))
        ));
        assert_eq!(opened.load(Ordering::SeqCst) - before, 1);

        runtime.shutdown().await;
        assert_eq!(
            opened.load(Ordering::SeqCst),
            disconnects.load(Ordering::SeqCst)
        );
    }

    #[tokio::test]
    async fn test_declaration_error_leaves_runtime_unstarted() {
        let runtime = OverflowRuntime::builder()
            .config(OverflowConfig::default())
            .without_declared()
            .without_logging()
            .declaration(
                ContractDeclaration::new("ChatInput", ContractKind::Input).with_parent("Input"),
            )
            .build()
            .unwrap();

        let err = runtime.startup().await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Core(CoreError::Declaration(DeclarationError::UnknownParent { .. }))
        ));
        assert!(!runtime.is_started());
        assert!(runtime.hierarchy().is_err());
    }

    #[tokio::test]
    async fn test_run_until_shuts_down() {
        let provider = TwitchProvider::default();
        let disconnects = Arc::clone(&provider.disconnects);
        let runtime = runtime(provider);

        runtime
            .run_until(tokio::time::sleep(Duration::from_millis(10)))
            .await
            .unwrap();

        assert!(runtime.shutdown_token().is_cancelled());
        assert!(runtime.connectors().is_empty().await);
        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let config = OverflowConfig {
            connectors: vec![
                ConnectorConfig::new("TwitchConnector", "acct1"),
                ConnectorConfig::new("TwitchConnector", "acct1"),
            ],
            ..Default::default()
        };
        let result = OverflowRuntime::builder()
            .config(config)
            .without_logging()
            .build();
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }
}
