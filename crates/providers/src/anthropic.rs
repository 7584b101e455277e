//! Anthropic native provider implementation.
//!
//! Uses Anthropic's Messages API directly:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - Native tool use with `tool_use` / `tool_result` content blocks

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use trendpost_config::AppConfig;
use trendpost_core::error::ProviderError;
use trendpost_core::message::{Message, Role};
use trendpost_core::provider::*;
use trendpost_core::tool::ToolCall;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    name: String,
    base_url: String,
    api_key: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider whose requests give up after `timeout`.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self {
            name: "anthropic".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            timeout,
            client,
        })
    }

    /// Build from application config. Fails when no API key is set.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProviderError> {
        let key = config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::NotConfigured("ANTHROPIC_API_KEY is not set".into()))?;
        Self::new(key, Duration::from_secs(config.agent.oracle_timeout_secs))
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Convert messages to Anthropic API format with content blocks.
    ///
    /// A round of tool results becomes one user message with one
    /// `tool_result` block per invocation, in invocation order. Blank
    /// assistant text is dropped; the API rejects empty content.
    fn to_api_messages(messages: &[Message]) -> Vec<AnthropicMessage> {
        let mut result = Vec::with_capacity(messages.len());

        for msg in messages {
            match msg.role {
                Role::User if !msg.tool_results.is_empty() => {
                    let blocks = msg
                        .tool_results
                        .iter()
                        .map(|r| ContentBlock::ToolResult {
                            tool_use_id: r.call_id.clone(),
                            content: r.to_content(),
                            is_error: !r.success,
                        })
                        .collect();
                    result.push(AnthropicMessage {
                        role: "user".into(),
                        content: AnthropicContent::Blocks(blocks),
                    });
                }
                Role::User => {
                    result.push(AnthropicMessage {
                        role: "user".into(),
                        content: AnthropicContent::Text(msg.content.clone()),
                    });
                }
                Role::Assistant if msg.tool_calls.is_empty() => {
                    if msg.content.trim().is_empty() {
                        continue;
                    }
                    result.push(AnthropicMessage {
                        role: "assistant".into(),
                        content: AnthropicContent::Text(msg.content.clone()),
                    });
                }
                Role::Assistant => {
                    let mut blocks: Vec<ContentBlock> = Vec::new();
                    if !msg.content.is_empty() {
                        blocks.push(ContentBlock::Text {
                            text: msg.content.clone(),
                        });
                    }
                    for tc in &msg.tool_calls {
                        blocks.push(ContentBlock::ToolUse {
                            id: tc.id.clone(),
                            name: tc.name.clone(),
                            input: tc.arguments.clone(),
                        });
                    }
                    result.push(AnthropicMessage {
                        role: "assistant".into(),
                        content: AnthropicContent::Blocks(blocks),
                    });
                }
            }
        }

        result
    }

    /// Convert tool definitions to Anthropic format.
    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<AnthropicTool> {
        tools
            .iter()
            .map(|t| AnthropicTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema.clone(),
            })
            .collect()
    }

    fn request_body(request: &ProviderRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": Self::to_api_messages(&request.messages),
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            "temperature": request.temperature,
        });

        if let Some(ref sys) = request.system {
            body["system"] = serde_json::json!(sys);
        }

        if !request.tools.is_empty() {
            body["tools"] = serde_json::json!(Self::to_api_tools(&request.tools));
        }

        body
    }
}

#[async_trait]
impl trendpost_core::Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = Self::request_body(&request);

        debug!(
            provider = "anthropic",
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(format!("no answer within {}s", self.timeout.as_secs()))
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(5);
            return Err(ProviderError::RateLimited { retry_after_secs });
        }
        if status == 401 || status == 403 {
            return Err(ProviderError::AuthenticationFailed(
                "Invalid Anthropic API key".into(),
            ));
        }
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Anthropic API error");
            return Err(ProviderError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_resp: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError {
                status_code: 200,
                message: format!("Failed to parse Anthropic response: {e}"),
            })?;

        Ok(Self::response_to_provider_response(api_resp))
    }
}

impl AnthropicProvider {
    /// Convert Anthropic API response to our ProviderResponse.
    fn response_to_provider_response(resp: AnthropicResponse) -> ProviderResponse {
        let mut text_content = String::new();
        let mut tool_calls = Vec::new();

        for block in resp.content {
            match block {
                ResponseContentBlock::Text { text } => {
                    if !text_content.is_empty() {
                        text_content.push('\n');
                    }
                    text_content.push_str(&text);
                }
                ResponseContentBlock::ToolUse { id, name, input } => {
                    tool_calls.push(ToolCall {
                        id,
                        name,
                        arguments: input,
                    });
                }
                ResponseContentBlock::Unknown => {}
            }
        }

        let mut message = Message::assistant_with_tools(text_content, tool_calls);
        message.id = resp.id;

        ProviderResponse {
            message,
            stop_reason: StopReason::parse(resp.stop_reason.as_deref()),
            usage: Some(Usage {
                input_tokens: resp.usage.input_tokens,
                output_tokens: resp.usage.output_tokens,
            }),
            model: resp.model,
        }
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: AnthropicContent,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum AnthropicContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    id: String,
    model: String,
    content: Vec<ResponseContentBlock>,
    usage: AnthropicUsage,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// Thinking, server tool blocks and anything newer
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}
