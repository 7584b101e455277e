//! Error types for the TrendPost domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all TrendPost operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Oracle errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Channel errors ---
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Source adapter errors ---
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    // --- Publishing errors ---
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    #[error("Message delivery failed to {channel}: {reason}")]
    DeliveryFailed { channel: String, reason: String },

    #[error("Unauthorized sender: {sender_id} on {channel}")]
    Unauthorized { channel: String, sender_id: String },

    #[error("Channel connection lost: {0}")]
    ConnectionLost(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name}: {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments for {tool_name}: {reason}")]
    InvalidArguments { tool_name: String, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("{source_name} request failed: {reason}")]
    Request { source_name: String, reason: String },

    #[error("{source_name} returned HTTP {status}")]
    Status { source_name: String, status: u16 },

    #[error("{source_name} timed out after {timeout_secs}s")]
    Timeout { source_name: String, timeout_secs: u64 },

    #[error("{source_name} returned an unreadable payload: {reason}")]
    Malformed { source_name: String, reason: String },

    #[error("{source_name} needs parameter '{param}'")]
    MissingParameter { source_name: String, param: String },
}

#[derive(Debug, Clone, Error)]
pub enum PublishError {
    #[error("Identity lookup failed: {0}")]
    Identity(String),

    #[error("Authorization rejected (status {status_code})")]
    Unauthorized { status_code: u16 },

    #[error("Publish request failed: {message} (status: {status_code})")]
    Rejected { status_code: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 529,
            message: "Overloaded".into(),
        });
        assert!(err.to_string().contains("529"));
        assert!(err.to_string().contains("Overloaded"));
    }

    #[test]
    fn tool_error_names_the_tool() {
        let err = Error::Tool(ToolError::InvalidArguments {
            tool_name: "get_reddit_trends".into(),
            reason: "missing field `subreddit`".into(),
        });
        assert!(err.to_string().contains("get_reddit_trends"));
        assert!(err.to_string().contains("subreddit"));
    }

    #[test]
    fn source_error_names_the_source() {
        let err = SourceError::Timeout {
            source_name: "hackernews".into(),
            timeout_secs: 10,
        };
        assert_eq!(err.to_string(), "hackernews timed out after 10s");
    }
}
