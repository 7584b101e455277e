//! Source adapter trait: the boundary to external trend sources.
//!
//! An adapter turns one external feed or API (RSS, Hacker News, Reddit, ...)
//! into [`SourceRecord`]s. Adapters own their network I/O and timeouts; the
//! trend pipeline only ever sees records or a [`SourceError`].

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;

/// One item pulled from an external source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub title: String,

    /// Link to the item (article URL, discussion permalink, ...)
    pub link: String,

    /// Short summary (may be empty)
    #[serde(default)]
    pub summary: String,

    /// Publication date (`YYYY-MM-DD`)
    pub published: NaiveDate,

    /// Human-readable origin, e.g. a feed title or `r/SaaS`
    pub source: String,

    /// Upvotes / points, when the source has them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,

    /// Comment count, when the source has it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<u64>,

    /// Category tag assigned by the aggregator (e.g. "rss", "reddit")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl SourceRecord {
    /// A record with only a title; everything else takes its default.
    pub fn titled(title: impl Into<String>, source: impl Into<String>, published: NaiveDate) -> Self {
        Self {
            title: title.into(),
            link: String::new(),
            summary: String::new(),
            published,
            source: source.into(),
            score: None,
            comments: None,
            category: None,
        }
    }
}

/// Time window for "top" listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Day,
    #[default]
    Week,
    Month,
}

impl TimeWindow {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
            TimeWindow::Month => "month",
        }
    }
}

/// Source-specific parameters for one adapter call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceQuery {
    /// Feed category (RSS)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Community name (Reddit)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<String>,

    #[serde(default)]
    pub window: TimeWindow,

    /// Maximum records to return
    pub limit: usize,
}

impl SourceQuery {
    pub fn feeds(category: impl Into<String>, limit: usize) -> Self {
        Self {
            category: Some(category.into()),
            community: None,
            window: TimeWindow::default(),
            limit,
        }
    }

    pub fn top_stories(limit: usize) -> Self {
        Self {
            category: None,
            community: None,
            window: TimeWindow::default(),
            limit,
        }
    }

    pub fn community(name: impl Into<String>, window: TimeWindow, limit: usize) -> Self {
        Self {
            category: None,
            community: Some(name.into()),
            window,
            limit,
        }
    }
}

/// The core SourceAdapter trait.
///
/// Implementations must return within their configured timeout and fill
/// missing fields with defaults instead of failing the whole call.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Short adapter name used in logs and errors (e.g. "reddit").
    fn name(&self) -> &str;

    /// Fetch records for the given query.
    async fn fetch(&self, query: &SourceQuery) -> std::result::Result<Vec<SourceRecord>, SourceError>;
}
