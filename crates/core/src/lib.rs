//! # TrendPost Core
//!
//! Domain types, traits, and error definitions for the TrendPost content agent.
//! This crate has **no I/O of its own**. It defines the domain model that the
//! oracle client, source adapters, publisher, tools and transports implement
//! against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here:
//! - [`Provider`]: the decision-making oracle (an LLM with tool use)
//! - [`SourceAdapter`]: one external feed or API yielding [`SourceRecord`]s
//! - [`Publisher`]: the network finished content is posted to
//! - [`Channel`]: the chat transport users talk through
//!
//! Implementations live in their respective crates.

pub mod error;
pub mod message;
pub mod provider;
pub mod tool;
pub mod source;
pub mod publish;
pub mod channel;
pub mod event;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Message, Role, Conversation, ConversationId};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StopReason, ToolDefinition};
pub use tool::{ToolCall, ToolExecutor, ToolResult};
pub use source::{SourceAdapter, SourceQuery, SourceRecord, TimeWindow};
pub use publish::{Publisher, PublishReceipt, Visibility};
pub use channel::{Channel, ChannelMessage, ChannelId};
pub use event::{DomainEvent, EventBus};
