use async_trait::async_trait;
use tracing::info;
use trendpost_core::error::PublishError;
use trendpost_core::publish::{PublishReceipt, Publisher, Visibility};

/// Accepts every post and sends nothing.
#[derive(Debug, Default)]
pub struct DryRunPublisher;

impl DryRunPublisher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Publisher for DryRunPublisher {
    fn name(&self) -> &str {
        "dry-run"
    }

    fn is_dry_run(&self) -> bool {
        true
    }

    async fn publish(&self, content: &str, visibility: Visibility) -> Result<PublishReceipt, PublishError> {
        let post_id = format!("dry-run-{}", uuid::Uuid::new_v4());
        info!(
            post_id = %post_id,
            visibility = visibility.as_str(),
            chars = content.chars().count(),
            "Dry-run publish"
        );
        Ok(PublishReceipt {
            post_id: Some(post_id),
            dry_run: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_marked_receipt() {
        let receipt = DryRunPublisher::new()
            .publish("Retention is the new growth", Visibility::Connections)
            .await
            .unwrap();
        assert!(receipt.dry_run);
        assert!(receipt.post_id.unwrap().starts_with("dry-run-"));
    }
}
