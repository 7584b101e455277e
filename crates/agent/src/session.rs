//! Per-chat agent sessions.
//!
//! Each chat owns one [`AgentSession`] behind its own async mutex, so a chat
//! runs at most one turn at a time while different chats proceed
//! concurrently. Nothing outlives the process.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;
use trendpost_core::message::Conversation;

/// The conversation state of one chat.
#[derive(Debug)]
pub struct AgentSession {
    key: String,
    pub conversation: Conversation,
}

impl AgentSession {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            conversation: Conversation::new(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Forget everything said so far.
    pub fn reset(&mut self) {
        self.conversation.clear();
    }
}

pub type SharedSession = Arc<Mutex<AgentSession>>;

#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, SharedSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The session for `key`, created empty on first use.
    pub async fn get_or_create(&self, key: &str) -> SharedSession {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(key.to_string())
            .or_insert_with(|| {
                debug!(session = key, "Opening session");
                Arc::new(Mutex::new(AgentSession::new(key)))
            })
            .clone()
    }

    /// Clear one session's conversation. Waits for its in-flight turn.
    /// Returns false when the key has no session.
    pub async fn reset(&self, key: &str) -> bool {
        let session = self.sessions.lock().await.get(key).cloned();
        match session {
            Some(session) => {
                session.lock().await.reset();
                debug!(session = key, "Session reset");
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
