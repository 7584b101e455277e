//! The tools the oracle can call.
//!
//! The catalog is closed: [`ToolKind`] lists every tool, [`ToolRequest`]
//! is the typed form of a call, and [`ToolDispatcher`] executes calls against
//! the sources, the trend pipeline and the publisher.

pub mod catalog;
pub mod dispatch;
pub mod request;

pub use catalog::{ToolKind, definitions};
pub use dispatch::{ToolContext, ToolDispatcher};
pub use request::ToolRequest;
