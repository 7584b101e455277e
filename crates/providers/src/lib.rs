//! Oracle provider implementations for TrendPost.
//!
//! All providers implement the `trendpost_core::Provider` trait.

pub mod anthropic;

pub use anthropic::AnthropicProvider;
