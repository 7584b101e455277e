//! Publishers for TrendPost.
//!
//! [`from_config`] picks the real LinkedIn publisher when a usable access
//! token is configured and the dry-run publisher otherwise.

pub mod dry_run;
pub mod linkedin;

use std::sync::Arc;
use std::time::Duration;

use trendpost_config::PublishConfig;
use trendpost_core::error::PublishError;
use trendpost_core::publish::Publisher;

pub use dry_run::DryRunPublisher;
pub use linkedin::LinkedInPublisher;

pub fn from_config(config: &PublishConfig) -> Result<Arc<dyn Publisher>, PublishError> {
    match config.access_token.as_deref() {
        Some(token) if !config.is_dry_run() => Ok(Arc::new(LinkedInPublisher::new(
            token,
            &config.api_base,
            Duration::from_secs(config.timeout_secs),
        )?)),
        _ => {
            tracing::info!("No publish token configured, posts will not leave this machine");
            Ok(Arc::new(DryRunPublisher::new()))
        }
    }
}
