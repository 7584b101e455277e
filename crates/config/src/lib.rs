//! Configuration loading, validation, and management for TrendPost.
//!
//! Loads configuration from `~/.trendpost/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Publish tokens that select the dry-run publisher.
pub const DRY_RUN_TOKENS: &[&str] = &["mock_token_test_mode", "test_mode", "mock"];

/// The root configuration structure.
///
/// Maps directly to `~/.trendpost/config.toml`.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Oracle (Anthropic) API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// Trend source settings
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Publisher settings
    #[serde(default)]
    pub publish: PublishConfig,

    /// Telegram transport settings
    #[serde(default)]
    pub telegram: TelegramSettings,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("agent", &self.agent)
            .field("sources", &self.sources)
            .field("publish", &self.publish)
            .field("telegram", &self.telegram)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Tool rounds allowed per turn before the loop forces an answer
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: u32,

    /// Oracle request timeout
    #[serde(default = "default_oracle_timeout")]
    pub oracle_timeout_secs: u64,

    /// Industry / domain the relevance validator matches against
    #[serde(default = "default_industry")]
    pub industry: String,

    #[serde(default = "default_audience")]
    pub target_audience: String,

    /// Replace the built-in system prompt entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,
}

fn default_model() -> String {
    "claude-sonnet-4-5-20250929".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_max_tool_rounds() -> u32 {
    8
}
fn default_oracle_timeout() -> u64 {
    120
}
fn default_industry() -> String {
    "product management".into()
}
fn default_audience() -> String {
    "Product Managers, Directors of Product, Product Leads".into()
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_tool_rounds: default_max_tool_rounds(),
            oracle_timeout_secs: default_oracle_timeout(),
            industry: default_industry(),
            target_audience: default_audience(),
            system_prompt_override: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// Per-call timeout for every source adapter
    #[serde(default = "default_source_timeout")]
    pub timeout_secs: u64,

    /// Feed URLs per category
    #[serde(default = "default_feeds")]
    pub feeds: BTreeMap<String, Vec<String>>,

    /// Category used by the product trends aggregation
    #[serde(default = "default_product_category")]
    pub product_feed_category: String,

    /// Category used when a requested category is unknown
    #[serde(default = "default_feed_category")]
    pub default_feed_category: String,

    /// Entries taken from each feed before sorting
    #[serde(default = "default_entries_per_feed")]
    pub entries_per_feed: usize,

    /// Product communities, in priority order
    #[serde(default = "default_subreddits")]
    pub subreddits: Vec<String>,

    /// How many of `subreddits` the product aggregation polls
    #[serde(default = "default_product_subreddit_count")]
    pub product_subreddit_count: usize,

    #[serde(default = "default_per_subreddit_limit")]
    pub per_subreddit_limit: usize,

    #[serde(default = "default_limit")]
    pub hackernews_limit: usize,

    #[serde(default = "default_limit")]
    pub rss_limit: usize,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_source_timeout() -> u64 {
    10
}
fn default_product_category() -> String {
    "product_management".into()
}
fn default_feed_category() -> String {
    "technology".into()
}
fn default_entries_per_feed() -> usize {
    5
}
fn default_product_subreddit_count() -> usize {
    3
}
fn default_per_subreddit_limit() -> usize {
    5
}
fn default_limit() -> usize {
    10
}
fn default_user_agent() -> String {
    "TrendPost/0.1".into()
}

fn default_subreddits() -> Vec<String> {
    ["ProductManagement", "product_design", "startups", "SaaS", "userexperience", "analytics"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_feeds() -> BTreeMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 5] = [
        (
            "product_management",
            &[
                "https://www.mindtheproduct.com/feed/",
                "https://medium.com/feed/@ProductCoalition",
                "https://www.producttalk.org/feed/",
                "https://www.intercom.com/blog/feed/",
                "https://www.lennysnewsletter.com/feed",
            ],
        ),
        (
            "technology",
            &[
                "https://techcrunch.com/feed/",
                "https://www.theverge.com/rss/index.xml",
                "https://news.ycombinator.com/rss",
                "https://arstechnica.com/feed/",
            ],
        ),
        (
            "marketing",
            &[
                "https://www.searchenginejournal.com/feed/",
                "https://moz.com/blog/feed",
                "https://contentmarketinginstitute.com/feed/",
            ],
        ),
        (
            "startup",
            &[
                "https://news.ycombinator.com/rss",
                "https://techcrunch.com/category/startups/feed/",
                "https://www.reddit.com/r/startups/.rss",
            ],
        ),
        (
            "ai",
            &[
                "https://news.ycombinator.com/rss",
                "https://www.reddit.com/r/artificial/.rss",
                "https://www.reddit.com/r/MachineLearning/.rss",
            ],
        ),
    ];

    table
        .into_iter()
        .map(|(category, urls)| {
            (category.to_string(), urls.iter().map(|u| u.to_string()).collect())
        })
        .collect()
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_source_timeout(),
            feeds: default_feeds(),
            product_feed_category: default_product_category(),
            default_feed_category: default_feed_category(),
            entries_per_feed: default_entries_per_feed(),
            subreddits: default_subreddits(),
            product_subreddit_count: default_product_subreddit_count(),
            per_subreddit_limit: default_per_subreddit_limit(),
            hackernews_limit: default_limit(),
            rss_limit: default_limit(),
            user_agent: default_user_agent(),
        }
    }
}

impl SourcesConfig {
    /// The communities polled by the product aggregation.
    pub fn product_subreddits(&self) -> &[String] {
        let n = self.product_subreddit_count.min(self.subreddits.len());
        &self.subreddits[..n]
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Bearer token for the publishing API; a sentinel value selects dry-run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default = "default_publish_base")]
    pub api_base: String,

    #[serde(default = "default_publish_timeout")]
    pub timeout_secs: u64,
}

fn default_publish_base() -> String {
    "https://api.linkedin.com".into()
}
fn default_publish_timeout() -> u64 {
    30
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            api_base: default_publish_base(),
            timeout_secs: default_publish_timeout(),
        }
    }
}

impl std::fmt::Debug for PublishConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishConfig")
            .field("access_token", &redact(&self.access_token))
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("dry_run", &self.is_dry_run())
            .finish()
    }
}

impl PublishConfig {
    /// No token, an empty token, or a sentinel token means nothing is published.
    pub fn is_dry_run(&self) -> bool {
        match self.access_token.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(token) => DRY_RUN_TOKENS.contains(&token),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Sender IDs allowed to talk to the bot. Empty = everyone.
    #[serde(default)]
    pub allowed_users: Vec<String>,

    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    /// Replies longer than this are split into several messages
    #[serde(default = "default_max_message_chars")]
    pub max_message_chars: usize,
}

fn default_poll_timeout() -> u64 {
    30
}
fn default_max_message_chars() -> usize {
    4000
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            bot_token: None,
            allowed_users: vec![],
            poll_timeout_secs: default_poll_timeout(),
            max_message_chars: default_max_message_chars(),
        }
    }
}

impl std::fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("bot_token", &redact(&self.bot_token))
            .field("allowed_users", &self.allowed_users)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("max_message_chars", &self.max_message_chars)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.trendpost/config.toml),
    /// then apply environment overrides:
    /// - `ANTHROPIC_API_KEY`
    /// - `LINKEDIN_ACCESS_TOKEN`
    /// - `TELEGRAM_BOT_TOKEN`
    /// - `ALLOWED_USERS` (comma-separated sender IDs)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load from a specific file, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup` (the env itself in production).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("ANTHROPIC_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(token) = non_empty("LINKEDIN_ACCESS_TOKEN") {
            self.publish.access_token = Some(token);
        }
        if let Some(token) = non_empty("TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(users) = lookup("ALLOWED_USERS") {
            self.telegram.allowed_users = users
                .split(',')
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(String::from)
                .collect();
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".trendpost")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.agent.temperature) {
            return Err(ConfigError::ValidationError(
                "agent.temperature must be between 0.0 and 1.0".into(),
            ));
        }
        if self.agent.max_tool_rounds == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_tool_rounds must be at least 1".into(),
            ));
        }
        if self.agent.oracle_timeout_secs == 0
            || self.sources.timeout_secs == 0
            || self.publish.timeout_secs == 0
        {
            return Err(ConfigError::ValidationError("timeouts must be > 0 seconds".into()));
        }
        if !self.sources.feeds.contains_key(&self.sources.default_feed_category) {
            return Err(ConfigError::ValidationError(format!(
                "sources.default_feed_category '{}' has no feeds",
                self.sources.default_feed_category
            )));
        }
        if self.telegram.max_message_chars == 0 {
            return Err(ConfigError::ValidationError(
                "telegram.max_message_chars must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Check if an oracle API key is available.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agent.max_tool_rounds, 8);
        assert_eq!(config.agent.industry, "product management");
        assert!(config.sources.feeds.contains_key("product_management"));
        assert!(config.publish.is_dry_run());
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.agent.model, config.agent.model);
        assert_eq!(parsed.sources.feeds, config.sources.feeds);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.agent.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_round_ceiling_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_tool_rounds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.agent.model, default_model());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[agent]
industry = "marketing"
max_tool_rounds = 3

[sources]
subreddits = ["marketing", "SEO"]
product_subreddit_count = 5
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.agent.industry, "marketing");
        assert_eq!(config.agent.max_tool_rounds, 3);
        assert_eq!(config.agent.max_tokens, 4096);
        assert_eq!(config.sources.timeout_secs, 10);
        // Count is clamped to the configured list
        assert_eq!(config.sources.product_subreddits(), ["marketing", "SEO"]);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[agent\nmodel = ").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("ANTHROPIC_API_KEY", "sk-ant-123"),
            ("LINKEDIN_ACCESS_TOKEN", "real-token"),
            ("TELEGRAM_BOT_TOKEN", "bot:abc"),
            ("ALLOWED_USERS", " 42, 1337 ,,"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.api_key.as_deref(), Some("sk-ant-123"));
        assert!(!config.publish.is_dry_run());
        assert_eq!(config.telegram.bot_token.as_deref(), Some("bot:abc"));
        assert_eq!(config.telegram.allowed_users, vec!["42", "1337"]);
    }

    #[test]
    fn sentinel_tokens_select_dry_run() {
        for token in DRY_RUN_TOKENS {
            let publish = PublishConfig {
                access_token: Some(token.to_string()),
                ..PublishConfig::default()
            };
            assert!(publish.is_dry_run(), "{token} should be dry-run");
        }
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-ant-secret".into());
        config.telegram.bot_token = Some("bot:secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("product_management"));
        assert!(toml_str.contains("max_tool_rounds"));
    }
}
