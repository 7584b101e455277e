//! Message and Conversation domain types.
//!
//! These are the core value objects that flow through the agent:
//! User sends a message → Agent consults the oracle → Tools run → Oracle answers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::tool::{ToolCall, ToolResult};

/// Unique identifier for a conversation (session).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender in a conversation.
///
/// Tool results travel in `User` messages, as the oracle expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user (and tool results fed back to the oracle)
    User,
    /// The oracle
    Assistant,
}

/// A single message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub role: Role,

    /// The text content (may be empty for pure tool messages)
    pub content: String,

    /// Tool invocations requested by the assistant (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Tool results answering the previous assistant message (if any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_results: Vec<ToolResult>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content,
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into())
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into())
    }

    /// Create an assistant message carrying tool invocations.
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        let mut msg = Self::new(Role::Assistant, content.into());
        msg.tool_calls = tool_calls;
        msg
    }

    /// Create the user-role message that carries one round of tool results.
    pub fn tool_results(results: Vec<ToolResult>) -> Self {
        let mut msg = Self::new(Role::User, String::new());
        msg.tool_results = results;
        msg
    }

    /// Whether this assistant message asks for tools.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A conversation is an ordered sequence of messages owned by one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: ConversationId,

    /// Ordered messages
    pub messages: Vec<Message>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last message was added
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Add a message to the conversation.
    pub fn push(&mut self, message: Message) {
        self.updated_at = Utc::now();
        self.messages.push(message);
    }

    /// Append an assistant invocation message and its result message as one pair.
    ///
    /// The results must answer the invocations one-to-one, in order; otherwise
    /// nothing is appended.
    pub fn push_round(&mut self, assistant: Message, results: Vec<ToolResult>) -> crate::Result<()> {
        let call_ids = assistant.tool_calls.iter().map(|c| c.id.as_str());
        let result_ids = results.iter().map(|r| r.call_id.as_str());
        if assistant.tool_calls.is_empty() || !call_ids.eq(result_ids) {
            return Err(Error::Internal(format!(
                "tool round mismatch: {} invocations, {} results",
                assistant.tool_calls.len(),
                results.len()
            )));
        }
        self.push(assistant);
        self.push(Message::tool_results(results));
        Ok(())
    }

    /// Drop every message after the first `len` ones.
    pub fn truncate(&mut self, len: usize) {
        if len < self.messages.len() {
            self.messages.truncate(len);
            self.updated_at = Utc::now();
        }
    }

    /// Clear the whole conversation (session reset).
    pub fn clear(&mut self) {
        self.messages.clear();
        self.updated_at = Utc::now();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Every assistant invocation is answered by the very next message, id for id.
    pub fn is_well_formed(&self) -> bool {
        self.messages.iter().enumerate().all(|(i, msg)| {
            if !msg.has_tool_calls() {
                return true;
            }
            match self.messages.get(i + 1) {
                Some(next) => {
                    next.role == Role::User
                        && msg
                            .tool_calls
                            .iter()
                            .map(|c| &c.id)
                            .eq(next.tool_results.iter().map(|r| &r.call_id))
                }
                None => false,
            }
        })
    }

    /// Get the total token count estimate (rough: 4 chars ≈ 1 token).
    pub fn estimated_tokens(&self) -> usize {
        self.messages.iter().map(|m| m.content.len() / 4).sum()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
