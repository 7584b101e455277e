//! Reddit "top" listings for one community.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use trendpost_config::SourcesConfig;
use trendpost_core::error::SourceError;
use trendpost_core::source::{SourceAdapter, SourceQuery, SourceRecord};

use crate::http;

const DEFAULT_BASE_URL: &str = "https://www.reddit.com";

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    num_comments: u64,
    #[serde(default)]
    permalink: String,
    #[serde(default)]
    created_utc: Option<f64>,
}

pub struct RedditAdapter {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl RedditAdapter {
    pub fn new(config: &SourcesConfig) -> Result<Self, SourceError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        Ok(Self {
            client: http::build_client(&config.user_agent, timeout)?,
            base_url: DEFAULT_BASE_URL.into(),
            timeout,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Accepts `SaaS`, `r/SaaS` and `/r/SaaS/`.
fn community_name(raw: &str) -> Result<&str, SourceError> {
    let name = raw.trim().trim_matches('/');
    let name = name.strip_prefix("r/").unwrap_or(name);
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(SourceError::MissingParameter {
            source_name: "reddit".into(),
            param: "subreddit".into(),
        });
    }
    Ok(name)
}

fn post_to_record(post: Post, community: &str, today: NaiveDate) -> SourceRecord {
    let published = post
        .created_utc
        .and_then(|t| DateTime::<Utc>::from_timestamp(t as i64, 0))
        .map(|dt| dt.date_naive())
        .unwrap_or(today);
    SourceRecord {
        title: post.title,
        link: if post.permalink.is_empty() {
            String::new()
        } else {
            format!("https://reddit.com{}", post.permalink)
        },
        summary: String::new(),
        published,
        source: format!("r/{community}"),
        score: Some(post.score),
        comments: Some(post.num_comments),
        category: None,
    }
}

#[async_trait]
impl SourceAdapter for RedditAdapter {
    fn name(&self) -> &str {
        "reddit"
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<SourceRecord>, SourceError> {
        let community = community_name(query.community.as_deref().unwrap_or_default())?;
        let url = format!(
            "{}/r/{community}/top.json?t={}&limit={}",
            self.base_url,
            query.window.as_str(),
            query.limit
        );

        let listing: Listing = http::get_json(&self.client, &url, "reddit", self.timeout).await?;
        let today = Utc::now().date_naive();

        Ok(listing
            .data
            .children
            .into_iter()
            .take(query.limit)
            .map(|c| post_to_record(c.data, community, today))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_server;
    use trendpost_core::source::TimeWindow;

    const LISTING: &str = r#"{
        "kind": "Listing",
        "data": {
            "children": [
                {"kind": "t3", "data": {
                    "title": "How do you measure retention?",
                    "score": 512,
                    "num_comments": 97,
                    "permalink": "/r/ProductManagement/comments/abc/how_do_you/",
                    "created_utc": 1741600000.0
                }},
                {"kind": "t3", "data": {"title": "Weekly thread"}}
            ]
        }
    }"#;

    #[test]
    fn community_names() {
        assert_eq!(community_name("SaaS").unwrap(), "SaaS");
        assert_eq!(community_name("/r/product_design/").unwrap(), "product_design");
        assert!(community_name("").is_err());
        assert!(community_name("../admin").is_err());
    }

    #[tokio::test]
    async fn maps_listing_to_records() {
        let routes = test_server::Routes::from([(
            "/r/ProductManagement/top.json?t=month&limit=5".to_string(),
            (200, LISTING.to_string()),
        )]);
        let base = test_server::serve(routes).await;
        let adapter = RedditAdapter::new(&SourcesConfig::default()).unwrap().with_base_url(base);

        let records = adapter
            .fetch(&SourceQuery::community("ProductManagement", TimeWindow::Month, 5))
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        let first = &records[0];
        assert_eq!(first.source, "r/ProductManagement");
        assert_eq!(first.score, Some(512));
        assert_eq!(first.comments, Some(97));
        assert_eq!(
            first.link,
            "https://reddit.com/r/ProductManagement/comments/abc/how_do_you/"
        );
        assert_eq!(first.published, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());

        assert_eq!(records[1].score, Some(0));
        assert!(records[1].link.is_empty());
    }

    #[tokio::test]
    async fn private_community_is_a_status_error() {
        let routes = test_server::Routes::from([(
            "/r/secret/top.json?t=week&limit=10".to_string(),
            (403, r#"{"reason": "private"}"#.to_string()),
        )]);
        let base = test_server::serve(routes).await;
        let adapter = RedditAdapter::new(&SourcesConfig::default()).unwrap().with_base_url(base);

        let err = adapter
            .fetch(&SourceQuery::community("secret", TimeWindow::Week, 10))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 403, .. }));
    }

    #[tokio::test]
    async fn missing_community_is_rejected() {
        let adapter = RedditAdapter::new(&SourcesConfig::default()).unwrap();
        let err = adapter.fetch(&SourceQuery::top_stories(5)).await.unwrap_err();
        assert!(matches!(err, SourceError::MissingParameter { .. }));
    }
}
