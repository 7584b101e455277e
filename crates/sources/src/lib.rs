//! Source adapters for TrendPost.
//!
//! Every adapter implements `trendpost_core::SourceAdapter` and owns its HTTP
//! client and timeouts. [`SourceSet`] builds the three of them from config.

mod http;
pub mod hackernews;
pub mod reddit;
pub mod rss;

use std::sync::Arc;

use trendpost_config::SourcesConfig;
use trendpost_core::error::SourceError;

pub use hackernews::HackerNewsAdapter;
pub use reddit::RedditAdapter;
pub use rss::{RssAdapter, parse_feed};

/// The configured adapters, shareable across tasks.
#[derive(Clone)]
pub struct SourceSet {
    pub rss: Arc<RssAdapter>,
    pub hackernews: Arc<HackerNewsAdapter>,
    pub reddit: Arc<RedditAdapter>,
}

impl SourceSet {
    pub fn from_config(config: &SourcesConfig) -> Result<Self, SourceError> {
        Ok(Self {
            rss: Arc::new(RssAdapter::new(config)?),
            hackernews: Arc::new(HackerNewsAdapter::new(config)?),
            reddit: Arc::new(RedditAdapter::new(config)?),
        })
    }
}
