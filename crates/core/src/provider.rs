//! Provider trait: the abstraction over the decision-making oracle.
//!
//! A Provider receives the system instructions, the tool catalog and the full
//! conversation, and answers either with final text or with one or more tool
//! invocations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::message::Message;

/// One consultation of the oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "claude-sonnet-4-5-20250929")
    pub model: String,

    /// Static system instructions for the session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// The full ordered conversation
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Available tools the oracle can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

fn default_temperature() -> f32 {
    0.7
}

/// A tool definition sent to the oracle so it knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema (`type: object`, `properties`, `required`)
    pub input_schema: serde_json::Value,
}

/// Why the oracle stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
    #[serde(other)]
    Other,
}

impl StopReason {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("end_turn") | None => StopReason::EndTurn,
            Some("tool_use") => StopReason::ToolUse,
            Some("max_tokens") => StopReason::MaxTokens,
            Some("stop_sequence") => StopReason::StopSequence,
            Some(_) => StopReason::Other,
        }
    }
}

/// A complete response from the oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated assistant message (text and/or tool invocations)
    pub message: Message,

    /// Why generation stopped
    pub stop_reason: StopReason,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// The core Provider trait.
///
/// The agent loop calls `complete()` without knowing which backend answers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "anthropic").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ProviderRequest) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}
