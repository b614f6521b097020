//! Twitch Chat Demo
//!
//! Declares chat contracts with the ChatOverflow attribute macros, provides
//! an in-memory Twitch connector and walks through the host lifecycle:
//!
//! ```text
//! chatoverflow.toml ──▶ OverflowRuntime::startup ──▶ TwitchProvider::connect("acct1")
//!                                │
//!                                ├─▶ instantiate ChatRequirement (acct1)
//!                                └─▶ instantiate ChatOutput
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package twitch-chat
//! cargo run --package twitch-chat -- --wait   # keep running until Ctrl+C
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chatoverflow::prelude::*;
use clap::Parser;
use parking_lot::Mutex;
use serde::Deserialize;
use tracing::info;

// ============================================================================
// Contracts
// ============================================================================

#[contract(output)]
pub trait Output {}

/// Somewhere chat lines can be shown.
#[contract(output, parent = Output)]
pub trait ChatOutput {
    fn show(&self, line: &str) -> String;
}

#[contract(requirement)]
pub trait Requirement {}

/// Read and write access to a chat channel.
#[contract(requirement, parent = Requirement)]
pub trait ChatRequirement {
    fn channel(&self) -> String;
    fn send(&self, message: &str);
    fn history(&self) -> Vec<String>;
}

// ============================================================================
// Connector
// ============================================================================

/// A pretend Twitch session keeping messages in memory.
#[connector]
pub struct TwitchConnector {
    account: String,
    channel: String,
    messages: Mutex<Vec<String>>,
}

#[async_trait]
impl Connector for TwitchConnector {
    fn connector_type(&self) -> ConnectorTypeId {
        Self::connector_type_id()
    }

    async fn disconnect(&self) -> Result<(), BoxError> {
        info!(
            account = %self.account,
            messages = self.messages.lock().len(),
            "Leaving Twitch channel"
        );
        Ok(())
    }
}

#[derive(Deserialize)]
struct TwitchSettings {
    oauth: String,
    #[serde(default = "default_channel")]
    channel: String,
}

fn default_channel() -> String {
    "lobby".to_string()
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
        settings: &serde_json::Value,
    ) -> Result<Arc<dyn Connector>, BoxError> {
        let settings = TwitchSettings::deserialize(settings)?;
        if !settings.oauth.starts_with("oauth:") {
            return Err(format!("invalid oauth token for '{key}'").into());
        }

        info!(account = key, channel = %settings.channel, "Joined Twitch channel");
        Ok(Arc::new(TwitchConnector {
            account: key.to_string(),
            channel: settings.channel,
            messages: Mutex::new(Vec::new()),
        }))
    }
}

// ============================================================================
// Plugins
// ============================================================================

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
    fn channel(&self) -> String {
        self.connector.channel.clone()
    }

    fn send(&self, message: &str) {
        let line = format!("{}: {message}", self.connector.account);
        self.connector.messages.lock().push(line);
    }

    fn history(&self) -> Vec<String> {
        self.connector.messages.lock().clone()
    }
}

pub struct ConsoleChatOutputImpl {
    prefix: String,
}

impl Plugin for ConsoleChatOutputImpl {
    fn create(ctx: &PluginContext) -> Result<Self, BoxError> {
        #[derive(Deserialize)]
        struct Settings {
            #[serde(default)]
            prefix: String,
        }
        let settings: Settings = ctx.config()?;
        Ok(Self {
            prefix: settings.prefix,
        })
    }
}

#[implementation]
impl ChatOutput for ConsoleChatOutputImpl {
    fn show(&self, line: &str) -> String {
        let shown = format!("{} {line}", self.prefix);
        info!("{shown}");
        shown
    }
}

// ============================================================================
// Host
// ============================================================================

#[derive(Parser)]
#[command(about = "ChatOverflow Twitch chat demo")]
struct Args {
    /// Configuration file.
    #[arg(short, long, default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/chatoverflow.toml"))]
    config: PathBuf,

    /// Configuration profile.
    #[arg(short, long)]
    profile: Option<String>,

    /// Keep running until Ctrl+C.
    #[arg(long)]
    wait: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut builder = OverflowRuntime::builder()
        .config_file(&args.config)
        .provider(TwitchProvider);
    if let Some(profile) = &args.profile {
        builder = builder.profile(profile);
    }
    let runtime = builder.build().context("failed to build runtime")?;

    runtime.startup().await?;
    info!("{}", runtime.stats().await);

    let chat = runtime
        .instantiate_impl::<TwitchChatRequirementImpl>(Some("acct1"))
        .await?
        .as_contract::<dyn ChatRequirement>()
        .context("plugin does not expose ChatRequirement")?;
    let output = runtime
        .instantiate("ChatOutput", "ConsoleChatOutputImpl", None)
        .await?
        .as_contract::<dyn ChatOutput>()
        .context("plugin does not expose ChatOutput")?;

    chat.send("hello chat");
    chat.send("!uptime");
    info!(channel = %chat.channel(), "Replaying chat history");
    for line in chat.history() {
        output.show(&line);
    }

    // acct2 is disabled in the configuration.
    if let Err(e) = runtime
        .instantiate_impl::<TwitchChatRequirementImpl>(Some("acct2"))
        .await
    {
        info!(error = %e, "acct2 is not connected");
    }

    if args.wait {
        runtime.run().await?;
    } else {
        runtime
            .run_until(tokio::time::sleep(Duration::from_millis(100)))
            .await?;
    }
    Ok(())
}
