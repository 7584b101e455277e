//! Subcommand implementations and the wiring they share.

pub mod bot;
pub mod chat;
pub mod sources;
pub mod trends;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use trendpost_agent::{AgentLoop, SessionStore};
use trendpost_channels::BotRouter;
use trendpost_config::AppConfig;
use trendpost_core::event::EventBus;
use trendpost_providers::AnthropicProvider;
use trendpost_tools::{ToolContext, ToolDispatcher};

pub type CommandResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Load the config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> CommandResult<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    };
    config.map_err(|e| format!("Failed to load config: {e}").into())
}

/// Print setup help and fail when no oracle key is configured.
fn require_api_key(config: &AppConfig) -> CommandResult {
    if config.has_api_key() {
        return Ok(());
    }
    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set the environment variable:");
    eprintln!("    export ANTHROPIC_API_KEY='sk-ant-...'");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
    Err("No API key found. See above for setup instructions.".into())
}

/// The agent and everything a router needs around it.
pub struct Runtime {
    pub agent: Arc<AgentLoop>,
    pub sessions: Arc<SessionStore>,
    pub event_bus: Arc<EventBus>,
    pub dry_run: bool,
}

impl Runtime {
    pub fn build(config: &AppConfig) -> CommandResult<Self> {
        require_api_key(config)?;

        let provider = AnthropicProvider::from_config(config)?;
        let context = ToolContext::from_config(config)?;
        let dry_run = context.publisher.is_dry_run();
        let tools = Arc::new(ToolDispatcher::new(context));
        let event_bus = Arc::new(EventBus::default());
        let agent = AgentLoop::from_settings(Arc::new(provider), tools, &config.agent, Arc::clone(&event_bus));

        debug!(
            model = %config.agent.model,
            max_tool_rounds = agent.max_tool_rounds(),
            dry_run,
            "Runtime ready"
        );

        Ok(Self {
            agent: Arc::new(agent),
            sessions: Arc::new(SessionStore::new()),
            event_bus,
            dry_run,
        })
    }

    pub fn router(&self, config: &AppConfig) -> BotRouter {
        BotRouter::new(Arc::clone(&self.agent), Arc::clone(&self.sessions), Arc::clone(&self.event_bus))
            .with_dry_run(self.dry_run)
            .with_sources(&config.sources)
            .with_max_message_chars(config.telegram.max_message_chars)
    }
}
