//! Turn lifecycle events.
//!
//! The router and the agent loop report what a chat turn went through:
//! message in, oracle rounds, tool runs, and how the turn ended. The binary
//! mirrors them into the debug log; tests subscribe to check the sequence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Events buffered per subscriber before the slowest one starts lagging.
pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A chat message reached the router (before the allow-list check)
    MessageReceived {
        channel: String,
        sender_id: String,
        /// First 50 characters
        content_preview: String,
        timestamp: DateTime<Utc>,
    },

    /// One oracle call of a turn returned
    OracleConsulted {
        conversation_id: String,
        model: String,
        /// 1-based consultation number within the turn
        round: u32,
        tool_calls: usize,
        tokens_used: u32,
        timestamp: DateTime<Utc>,
    },

    ToolExecuted {
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// The oracle gave a final answer after `rounds` tool rounds
    TurnCompleted {
        conversation_id: String,
        rounds: u32,
        timestamp: DateTime<Utc>,
    },

    /// The turn ended on the tool-round ceiling with a fallback answer
    RoundCeilingReached {
        conversation_id: String,
        max_rounds: u32,
        timestamp: DateTime<Utc>,
    },

    /// A turn failed and its history was rolled back
    ErrorOccurred {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// Stable snake_case name, matching the serialized `event` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainEvent::MessageReceived { .. } => "message_received",
            DomainEvent::OracleConsulted { .. } => "oracle_consulted",
            DomainEvent::ToolExecuted { .. } => "tool_executed",
            DomainEvent::TurnCompleted { .. } => "turn_completed",
            DomainEvent::RoundCeilingReached { .. } => "round_ceiling_reached",
            DomainEvent::ErrorOccurred { .. } => "error_occurred",
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            DomainEvent::MessageReceived { timestamp, .. }
            | DomainEvent::OracleConsulted { timestamp, .. }
            | DomainEvent::ToolExecuted { timestamp, .. }
            | DomainEvent::TurnCompleted { timestamp, .. }
            | DomainEvent::RoundCeilingReached { timestamp, .. }
            | DomainEvent::ErrorOccurred { timestamp, .. } => *timestamp,
        }
    }
}

/// Fan-out of turn events to any number of listeners.
///
/// Publishing never blocks the turn; a listener that falls more than
/// `capacity` events behind misses the oldest ones.
pub struct EventBus {
    tx: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: DomainEvent) {
        // Nobody listening is the normal case outside `bot` and tests
        let _ = self.tx.send(Arc::new(event));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.tx.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
