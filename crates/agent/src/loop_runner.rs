//! The agent turn loop.
//!
//! One turn moves `Idle -> AwaitingOracle -> (ToolRound -> AwaitingOracle)* -> Terminal`.
//! The user message is appended first; each tool round appends the assistant
//! invocation message and its result message as one pair; the final answer is
//! appended last. If the oracle cannot be reached the conversation is rolled
//! back to where the turn started.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info, warn};
use trendpost_config::AgentSettings;
use trendpost_core::event::{DomainEvent, EventBus};
use trendpost_core::message::{Conversation, Message};
use trendpost_core::provider::{Provider, ProviderRequest, ProviderResponse, StopReason, ToolDefinition};
use trendpost_core::tool::{ToolCall, ToolExecutor, ToolResult};

use crate::prompts::system_prompt;
use crate::session::AgentSession;

/// Error text given to invocations left unanswered at the ceiling.
/// Stored in place of an empty final answer so the history stays valid.
pub const NO_ANSWER_PLACEHOLDER: &str = "(no answer)";

pub const ROUND_LIMIT_ERROR: &str = "tool round limit reached";

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    /// Text for the user; never empty when the ceiling was hit
    pub answer: String,
    /// Tool rounds executed
    pub rounds: u32,
    pub terminated_by_ceiling: bool,
}

pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    tools: Arc<dyn ToolExecutor>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    system_prompt: String,
    max_tool_rounds: u32,
    event_bus: Arc<EventBus>,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<dyn ToolExecutor>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            system_prompt: system_prompt.into(),
            max_tool_rounds: 8,
            event_bus,
        }
    }

    /// Build from `[agent]` settings, including the system prompt.
    pub fn from_settings(
        provider: Arc<dyn Provider>,
        tools: Arc<dyn ToolExecutor>,
        settings: &AgentSettings,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self::new(provider, tools, &settings.model, system_prompt(settings), event_bus)
            .with_temperature(settings.temperature)
            .with_max_tokens(settings.max_tokens)
            .with_max_tool_rounds(settings.max_tool_rounds)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the tool-round ceiling; at least one round is always allowed.
    pub fn with_max_tool_rounds(mut self, max: u32) -> Self {
        self.max_tool_rounds = max.max(1);
        self
    }

    pub fn max_tool_rounds(&self) -> u32 {
        self.max_tool_rounds
    }

    /// Run one user turn against `session`.
    pub async fn run_turn(
        &self,
        session: &mut AgentSession,
        user_text: &str,
    ) -> Result<TurnOutcome, trendpost_core::Error> {
        let conversation = &mut session.conversation;
        let checkpoint = conversation.len();
        conversation.push(Message::user(user_text));

        info!(
            session = %conversation.id,
            messages = conversation.len(),
            "Starting turn"
        );

        let outcome = self.drive(conversation).await;
        if let Err(e) = &outcome {
            warn!(session = %conversation.id, error = %e, "Turn failed, rolling back");
            conversation.truncate(checkpoint);
            self.event_bus.publish(DomainEvent::ErrorOccurred {
                context: "agent turn".into(),
                error_message: e.to_string(),
                timestamp: Utc::now(),
            });
        }
        outcome
    }

    async fn drive(&self, conversation: &mut Conversation) -> Result<TurnOutcome, trendpost_core::Error> {
        let definitions = self.tools.definitions();
        let mut rounds = 0u32;
        let mut last_text = String::new();

        loop {
            let response = self.consult(conversation, &definitions, rounds + 1).await?;
            let message = response.message;

            if !message.has_tool_calls() {
                let answer = message.content.clone();
                if answer.trim().is_empty() {
                    warn!(session = %conversation.id, "Oracle returned no text");
                    conversation.push(Message::assistant(NO_ANSWER_PLACEHOLDER));
                } else {
                    conversation.push(message);
                }
                self.event_bus.publish(DomainEvent::TurnCompleted {
                    conversation_id: conversation.id.to_string(),
                    rounds,
                    timestamp: Utc::now(),
                });
                info!(session = %conversation.id, rounds, "Turn completed");
                return Ok(TurnOutcome {
                    answer,
                    rounds,
                    terminated_by_ceiling: false,
                });
            }

            if !message.content.trim().is_empty() {
                last_text = message.content.clone();
            }

            if rounds >= self.max_tool_rounds {
                return self.stop_at_ceiling(conversation, message, rounds, &last_text);
            }

            rounds += 1;
            debug!(
                session = %conversation.id,
                round = rounds,
                calls = message.tool_calls.len(),
                "Executing tool round"
            );
            let results = self.execute_round(&message.tool_calls).await;
            conversation.push_round(message, results)?;
        }
    }

    async fn consult(
        &self,
        conversation: &Conversation,
        definitions: &[ToolDefinition],
        round: u32,
    ) -> Result<ProviderResponse, trendpost_core::Error> {
        let request = ProviderRequest {
            model: self.model.clone(),
            system: Some(self.system_prompt.clone()),
            messages: conversation.messages.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: definitions.to_vec(),
        };

        let started = Instant::now();
        let response = self.provider.complete(request).await?;
        let tokens_used = response.usage.as_ref().map(|u| u.total()).unwrap_or(0);

        let wants_tools = response.message.has_tool_calls();
        if wants_tools != (response.stop_reason == StopReason::ToolUse) {
            warn!(
                stop_reason = ?response.stop_reason,
                tool_calls = response.message.tool_calls.len(),
                "Stop reason disagrees with response content, following the content"
            );
        }

        debug!(
            session = %conversation.id,
            round,
            model = %response.model,
            tokens_used,
            duration_ms = started.elapsed().as_millis() as u64,
            "Oracle answered"
        );
        self.event_bus.publish(DomainEvent::OracleConsulted {
            conversation_id: conversation.id.to_string(),
            model: response.model.clone(),
            round,
            tool_calls: response.message.tool_calls.len(),
            tokens_used,
            timestamp: Utc::now(),
        });

        Ok(response)
    }

    async fn execute_round(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(calls.len());
        for call in calls {
            let started = Instant::now();
            let result = self.tools.dispatch(call).await;
            self.event_bus.publish(DomainEvent::ToolExecuted {
                tool_name: call.name.clone(),
                success: result.success,
                duration_ms: started.elapsed().as_millis() as u64,
                timestamp: Utc::now(),
            });
            results.push(result);
        }
        results
    }

    /// Answer the outstanding invocations with failures and close the turn
    /// with a fallback message.
    fn stop_at_ceiling(
        &self,
        conversation: &mut Conversation,
        message: Message,
        rounds: u32,
        last_text: &str,
    ) -> Result<TurnOutcome, trendpost_core::Error> {
        warn!(
            session = %conversation.id,
            max_rounds = self.max_tool_rounds,
            "Tool round ceiling reached"
        );

        let refused = message
            .tool_calls
            .iter()
            .map(|c| ToolResult::failure(&c.id, ROUND_LIMIT_ERROR))
            .collect();
        conversation.push_round(message, refused)?;

        let answer = fallback_answer(self.max_tool_rounds, last_text);
        conversation.push(Message::assistant(&answer));

        self.event_bus.publish(DomainEvent::RoundCeilingReached {
            conversation_id: conversation.id.to_string(),
            max_rounds: self.max_tool_rounds,
            timestamp: Utc::now(),
        });

        Ok(TurnOutcome {
            answer,
            rounds,
            terminated_by_ceiling: true,
        })
    }
}

fn fallback_answer(max_rounds: u32, last_text: &str) -> String {
    let mut answer = format!(
        "I stopped after {max_rounds} rounds of tool calls without a final answer. \
         Ask me to continue or narrow the request."
    );
    if !last_text.trim().is_empty() {
        answer.push_str("\n\nWhere I got to: ");
        answer.push_str(last_text.trim());
    }
    answer
}
