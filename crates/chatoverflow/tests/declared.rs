//! Plugins declared with the attribute macros, resolved through the runtime.

use std::sync::Arc;

use chatoverflow::prelude::*;
use chatoverflow::{
    ConnectorKey, ContractKind, CoreError, HierarchyBuilder, LookupError, MetadataRegistry,
    OverflowConfig,
};
use chatoverflow::runtime::ConnectorConfig;

#[contract(input)]
pub trait Input {}

#[contract(input, parent = Input)]
pub trait ChatInput {
    fn channel(&self) -> String;
}

#[contract(requirement)]
pub trait Requirement {}

#[contract(requirement, parent = Requirement, id = "ChatRequirement")]
pub trait ChatRequirement {
    fn account(&self) -> String;
}

#[connector]
pub struct TwitchConnector {
    account: String,
}

#[async_trait]
impl Connector for TwitchConnector {
    fn connector_type(&self) -> ConnectorTypeId {
        Self::connector_type_id()
    }
}

pub struct TwitchChatInputImpl {
    channel: String,
}

impl Plugin for TwitchChatInputImpl {
    fn create(ctx: &PluginContext) -> Result<Self, BoxError> {
        #[derive(serde::Deserialize)]
        struct Settings {
            #[serde(default)]
            channel: Option<String>,
        }
        let settings: Settings = ctx.config()?;
        Ok(Self {
            channel: settings.channel.unwrap_or_else(|| "lobby".into()),
        })
    }
}

#[implementation]
impl ChatInput for TwitchChatInputImpl {
    fn channel(&self) -> String {
        self.channel.clone()
    }
}

pub struct TwitchChatRequirementImpl {
    connector: Arc<TwitchConnector>,
}

impl Plugin for TwitchChatRequirementImpl {
    fn create(ctx: &PluginContext) -> Result<Self, BoxError> {
        Ok(Self {
            connector: ctx.connector::<TwitchConnector>()?,
        })
    }
}

#[implementation(connector = TwitchConnector)]
impl ChatRequirement for TwitchChatRequirementImpl {
    fn account(&self) -> String {
        self.connector.account.clone()
    }
}

struct TwitchProvider;

#[async_trait]
impl ConnectorProvider for TwitchProvider {
    fn connector_type(&self) -> ConnectorTypeId {
        TwitchConnector::connector_type_id()
    }

    async fn connect(
        &self,
        key: &str,
        _settings: &serde_json::Value,
    ) -> Result<Arc<dyn Connector>, BoxError> {
        Ok(Arc::new(TwitchConnector {
            account: key.to_string(),
        }))
    }
}

fn runtime(config: OverflowConfig) -> OverflowRuntime {
    OverflowRuntime::builder()
        .config(config)
        .without_logging()
        .provider(TwitchProvider)
        .build()
        .unwrap()
}

fn live(account: &str) -> Arc<TwitchConnector> {
    Arc::new(TwitchConnector {
        account: account.to_string(),
    })
}

#[test]
fn generated_metadata() {
    assert_eq!(<dyn Input as ContractMeta>::ID, "Input");
    assert_eq!(<dyn Input as ContractMeta>::PARENT, None);
    assert_eq!(<dyn ChatInput as ContractMeta>::PARENT, Some("Input"));
    assert_eq!(
        <dyn ChatRequirement as ContractMeta>::KIND,
        ContractKind::Requirement
    );
    assert_eq!(<TwitchConnector as ConnectorMeta>::ID, "TwitchConnector");
    assert_eq!(<TwitchChatInputImpl as ImplementationMeta>::CONTRACT, "ChatInput");
    assert_eq!(<TwitchChatInputImpl as ImplementationMeta>::CONNECTOR, None);
    assert_eq!(
        <TwitchChatRequirementImpl as ImplementationMeta>::CONNECTOR,
        Some("TwitchConnector")
    );
}

#[test]
fn declarations_are_collected() {
    let mut registry = MetadataRegistry::new();
    assert_eq!(registry.register_declared().unwrap(), 7);
    assert_eq!(registry.contracts().len(), 4);
    assert_eq!(registry.implementations().len(), 2);
    assert_eq!(registry.connector_types().len(), 1);
    registry.freeze();

    let hierarchy = HierarchyBuilder::from_registry(&registry)
        .unwrap()
        .build()
        .unwrap();
    assert_eq!(hierarchy.roots().len(), 2);
    assert_eq!(hierarchy.root_of("ChatInput").unwrap(), "Input");
    assert_eq!(hierarchy.root_of("ChatRequirement").unwrap(), "Requirement");
}

#[tokio::test]
async fn input_without_connector() {
    let runtime = runtime(OverflowConfig::default());
    runtime.startup().await.unwrap();

    let plugin = runtime
        .instantiate("ChatInput", "TwitchChatInputImpl", None)
        .await
        .unwrap();
    assert!(plugin.connector().is_none());
    assert_eq!(
        plugin.as_contract::<dyn ChatInput>().unwrap().channel(),
        "lobby"
    );
}

#[tokio::test]
async fn plugin_section_reaches_constructor() {
    let mut config = OverflowConfig::default();
    config.plugins.insert(
        "TwitchChatInputImpl".into(),
        serde_json::json!({ "channel": "speedruns" }),
    );
    let runtime = runtime(config);
    runtime.startup().await.unwrap();

    let plugin = runtime
        .instantiate_impl::<TwitchChatInputImpl>(None)
        .await
        .unwrap();
    assert_eq!(
        plugin.as_contract::<dyn ChatInput>().unwrap().channel(),
        "speedruns"
    );
}

#[tokio::test]
async fn requirement_needs_connector_key() {
    let runtime = runtime(OverflowConfig::default());
    runtime.startup().await.unwrap();

    let err = runtime
        .instantiate("ChatRequirement", "TwitchChatRequirementImpl", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RuntimeError::Core(CoreError::Lookup(LookupError::MissingConnectorKey { .. }))
    ));

    let instance = live("acct1");
    runtime
        .connectors()
        .add_connector(
            TwitchConnector::connector_type_id(),
            "acct1",
            instance.clone(),
        )
        .await
        .unwrap();

    let first = runtime
        .instantiate("ChatRequirement", "TwitchChatRequirementImpl", Some("acct1"))
        .await
        .unwrap();
    let held = first.downcast::<TwitchChatRequirementImpl>().unwrap();
    assert!(Arc::ptr_eq(&held.connector, &instance));

    // Same arguments, unchanged registry: same connector instance.
    let second = runtime
        .instantiate_impl::<TwitchChatRequirementImpl>(Some("acct1"))
        .await
        .unwrap();
    let again = second.downcast::<TwitchChatRequirementImpl>().unwrap();
    assert!(Arc::ptr_eq(&held.connector, &again.connector));
    assert!(first.connector().unwrap().ptr_eq(second.connector().unwrap()));
}

#[tokio::test]
async fn duplicate_connector_until_removed() {
    let runtime = runtime(OverflowConfig::default());
    let connectors = runtime.connectors();
    let twitch = TwitchConnector::connector_type_id();

    connectors
        .add_connector(twitch.clone(), "acct1", live("acct1"))
        .await
        .unwrap();

    let err = connectors
        .add_connector(twitch.clone(), "acct1", live("acct1"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Lookup(LookupError::DuplicateConnector { .. })
    ));

    connectors.remove_connector(&twitch, "acct1").await.unwrap();
    connectors
        .add_connector(twitch, "acct1", live("acct1"))
        .await
        .unwrap();
}

#[tokio::test]
async fn configured_connectors_are_established() {
    let config = OverflowConfig {
        connectors: vec![
            ConnectorConfig::new("TwitchConnector", "acct1"),
            ConnectorConfig {
                enabled: false,
                ..ConnectorConfig::new("TwitchConnector", "acct2")
            },
        ],
        ..Default::default()
    };
    let runtime = runtime(config);
    runtime.startup().await.unwrap();

    assert_eq!(
        runtime.connectors().keys().await,
        vec![ConnectorKey::new("TwitchConnector", "acct1")]
    );

    let plugin = runtime
        .instantiate("ChatRequirement", "TwitchChatRequirementImpl", Some("acct1"))
        .await
        .unwrap();
    assert_eq!(
        plugin
            .as_contract::<dyn ChatRequirement>()
            .unwrap()
            .account(),
        "acct1"
    );

    assert_eq!(runtime.shutdown().await, 1);
}
