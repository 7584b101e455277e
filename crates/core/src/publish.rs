//! Publisher trait: where finished posts go.
//!
//! Publishing is not idempotent on the remote side, so callers must never
//! retry a failed publish on their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PublishError;

/// Who can see a published post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Visibility {
    #[default]
    Public,
    Connections,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "PUBLIC",
            Visibility::Connections => "CONNECTIONS",
        }
    }
}

/// Proof that a post was accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReceipt {
    /// Identifier assigned by the network; `None` when an accepted post
    /// came back without one
    pub post_id: Option<String>,

    /// True when nothing was actually sent (dry-run publisher)
    #[serde(default)]
    pub dry_run: bool,
}

#[async_trait]
pub trait Publisher: Send + Sync {
    /// Short publisher name (e.g. "linkedin", "dry-run").
    fn name(&self) -> &str;

    /// Whether this publisher only pretends to publish.
    fn is_dry_run(&self) -> bool {
        false
    }

    /// Resolve the acting identity and submit the content.
    async fn publish(
        &self,
        content: &str,
        visibility: Visibility,
    ) -> std::result::Result<PublishReceipt, PublishError>;
}
