//! Hacker News top stories via the Firebase API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::debug;
use trendpost_config::SourcesConfig;
use trendpost_core::error::SourceError;
use trendpost_core::source::{SourceAdapter, SourceQuery, SourceRecord};

use crate::http;

const DEFAULT_BASE_URL: &str = "https://hacker-news.firebaseio.com/v0";
const ITEM_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct HnItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    descendants: Option<u64>,
    #[serde(default)]
    time: Option<i64>,
}

impl HnItem {
    fn into_record(self, id: u64, today: NaiveDate) -> SourceRecord {
        let published = self
            .time
            .and_then(|t| DateTime::<Utc>::from_timestamp(t, 0))
            .map(|dt| dt.date_naive())
            .unwrap_or(today);
        SourceRecord {
            title: self.title.unwrap_or_default(),
            // Ask HN / Show HN posts have no url
            link: self
                .url
                .unwrap_or_else(|| format!("https://news.ycombinator.com/item?id={id}")),
            summary: String::new(),
            published,
            source: "Hacker News".into(),
            score: Some(self.score.unwrap_or(0)),
            comments: Some(self.descendants.unwrap_or(0)),
            category: None,
        }
    }
}

pub struct HackerNewsAdapter {
    client: reqwest::Client,
    base_url: String,
    list_timeout: Duration,
    item_timeout: Duration,
}

impl HackerNewsAdapter {
    pub fn new(config: &SourcesConfig) -> Result<Self, SourceError> {
        let list_timeout = Duration::from_secs(config.timeout_secs);
        Ok(Self {
            client: http::build_client(&config.user_agent, list_timeout)?,
            base_url: DEFAULT_BASE_URL.into(),
            list_timeout,
            item_timeout: ITEM_TIMEOUT.min(list_timeout),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch_item(&self, id: u64, today: NaiveDate) -> Option<SourceRecord> {
        let url = format!("{}/item/{id}.json", self.base_url);
        // Deleted items come back as `null`
        match http::get_json::<Option<HnItem>>(&self.client, &url, "hackernews", self.item_timeout).await {
            Ok(Some(item)) => Some(item.into_record(id, today)),
            Ok(None) => None,
            Err(e) => {
                debug!(story = id, error = %e, "Skipping story");
                None
            }
        }
    }
}

#[async_trait]
impl SourceAdapter for HackerNewsAdapter {
    fn name(&self) -> &str {
        "hackernews"
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<SourceRecord>, SourceError> {
        let url = format!("{}/topstories.json", self.base_url);
        let ids: Vec<u64> = http::get_json(&self.client, &url, "hackernews", self.list_timeout).await?;
        let today = Utc::now().date_naive();

        let fetches = ids.into_iter().take(query.limit).map(|id| self.fetch_item(id, today));
        let records = futures::future::join_all(fetches)
            .await
            .into_iter()
            .flatten()
            .collect();
        Ok(records)
    }
}
