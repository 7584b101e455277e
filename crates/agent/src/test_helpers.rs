//! Scripted collaborators for loop tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use trendpost_core::error::ProviderError;
use trendpost_core::message::Message;
use trendpost_core::provider::{Provider, ProviderRequest, ProviderResponse, StopReason, ToolDefinition, Usage};
use trendpost_core::tool::{ToolCall, ToolExecutor, ToolResult};

/// Replays queued responses in order and records every request.
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(responses: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider ran out of responses"))
    }
}

/// Asks for one more tool on every consultation, with fresh ids.
#[derive(Default)]
pub struct InsistentProvider {
    calls: AtomicUsize,
}

impl InsistentProvider {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for InsistentProvider {
    fn name(&self) -> &str {
        "insistent"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(tool_response(
            &format!("Checking source #{n}"),
            vec![call(&format!("toolu_{n}"), "get_hackernews_trends")],
        ))
    }
}

/// Succeeds for every known name, fails for "launch_rocket".
#[derive(Default)]
pub struct EchoExecutor {
    executed: Mutex<Vec<String>>,
}

impl EchoExecutor {
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolExecutor for EchoExecutor {
    fn definitions(&self) -> Vec<ToolDefinition> {
        vec![ToolDefinition {
            name: "get_hackernews_trends".into(),
            description: "Top stories".into(),
            input_schema: serde_json::json!({"type": "object", "properties": {}, "required": []}),
        }]
    }

    async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        self.executed.lock().unwrap().push(call.id.clone());
        if call.name == "launch_rocket" {
            return ToolResult::failure(&call.id, format!("Unknown tool: {}", call.name));
        }
        ToolResult::ok(&call.id, serde_json::json!({ "tool": call.name }))
    }
}

pub fn call(id: &str, name: &str) -> ToolCall {
    ToolCall {
        id: id.into(),
        name: name.into(),
        arguments: serde_json::json!({}),
    }
}

pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        stop_reason: StopReason::EndTurn,
        usage: Some(Usage {
            input_tokens: 10,
            output_tokens: 5,
        }),
        model: "scripted-model".into(),
    }
}

pub fn tool_response(text: &str, calls: Vec<ToolCall>) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_with_tools(text, calls),
        stop_reason: StopReason::ToolUse,
        usage: Some(Usage {
            input_tokens: 20,
            output_tokens: 8,
        }),
        model: "scripted-model".into(),
    }
}
