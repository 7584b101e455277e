//! Trend aggregation: fan out to several source adapters, merge, rank.
//!
//! Adapters run concurrently, each under its own timeout. Results are merged
//! in plan order regardless of which adapter finished first, so a report is
//! identical to what a sequential run would produce. A failing adapter only
//! contributes an empty set and a failed status entry.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use trendpost_config::SourcesConfig;
use trendpost_core::error::SourceError;
use trendpost_core::source::{SourceAdapter, SourceQuery, SourceRecord, TimeWindow};
use trendpost_sources::SourceSet;

use crate::keywords::{KeywordCount, TOP_KEYWORDS, rank_keywords};

/// One adapter call in a plan.
#[derive(Clone)]
pub struct PlanEntry {
    /// Human-readable label, e.g. `r/SaaS`
    pub label: String,
    /// Category the records are counted and tagged under
    pub category: String,
    pub adapter: Arc<dyn SourceAdapter>,
    pub query: SourceQuery,
}

/// An ordered list of adapter calls.
#[derive(Clone, Default)]
pub struct TrendPlan {
    entries: Vec<PlanEntry>,
}

impl TrendPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(
        mut self,
        label: impl Into<String>,
        category: impl Into<String>,
        adapter: Arc<dyn SourceAdapter>,
        query: SourceQuery,
    ) -> Self {
        self.entries.push(PlanEntry {
            label: label.into(),
            category: category.into(),
            adapter,
            query,
        });
        self
    }

    /// Product trends: the product feed category, the first product
    /// communities over the past week, then Hacker News.
    pub fn product(sources: &SourceSet, config: &SourcesConfig) -> Self {
        let mut plan = Self::new().source(
            format!("feeds:{}", config.product_feed_category),
            "rss",
            sources.rss.clone(),
            SourceQuery::feeds(&config.product_feed_category, config.rss_limit),
        );
        for community in config.product_subreddits() {
            plan = plan.source(
                format!("r/{community}"),
                "reddit",
                sources.reddit.clone(),
                SourceQuery::community(community, TimeWindow::Week, config.per_subreddit_limit),
            );
        }
        plan.source(
            "hackernews",
            "hackernews",
            sources.hackernews.clone(),
            SourceQuery::top_stories(config.hackernews_limit),
        )
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of one plan entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceStatus {
    pub label: String,
    pub category: String,
    pub success: bool,
    pub count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedTrendReport {
    /// Records per category; every planned category is present
    pub source_counts: BTreeMap<String, usize>,
    /// Merged records in plan order, each tagged with its category
    pub records: Vec<SourceRecord>,
    pub keywords: Vec<KeywordCount>,
    pub statuses: Vec<SourceStatus>,
}

impl AggregatedTrendReport {
    pub fn total_records(&self) -> usize {
        self.records.len()
    }

    pub fn failed_sources(&self) -> usize {
        self.statuses.iter().filter(|s| !s.success).count()
    }
}

pub struct TrendAggregator {
    timeout: Duration,
}

impl TrendAggregator {
    /// `timeout` bounds every single adapter call.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn aggregate(&self, plan: &TrendPlan) -> AggregatedTrendReport {
        let started = Instant::now();
        let calls = plan.entries().iter().map(|entry| self.run(entry));
        let outcomes = futures::future::join_all(calls).await;

        let mut source_counts: BTreeMap<String, usize> = plan
            .entries()
            .iter()
            .map(|e| (e.category.clone(), 0))
            .collect();
        let mut records = Vec::new();
        let mut statuses = Vec::with_capacity(plan.len());

        for (entry, outcome) in plan.entries().iter().zip(outcomes) {
            match outcome {
                Ok(batch) => {
                    *source_counts.entry(entry.category.clone()).or_default() += batch.len();
                    statuses.push(SourceStatus {
                        label: entry.label.clone(),
                        category: entry.category.clone(),
                        success: true,
                        count: batch.len(),
                        error: None,
                    });
                    records.extend(batch.into_iter().map(|mut r| {
                        r.category = Some(entry.category.clone());
                        r
                    }));
                }
                Err(e) => {
                    warn!(source = %entry.label, adapter = entry.adapter.name(), error = %e, "Source failed");
                    statuses.push(SourceStatus {
                        label: entry.label.clone(),
                        category: entry.category.clone(),
                        success: false,
                        count: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let keywords = rank_keywords(
            records
                .iter()
                .flat_map(|r| [r.title.as_str(), r.summary.as_str()]),
            TOP_KEYWORDS,
        );

        let report = AggregatedTrendReport {
            source_counts,
            records,
            keywords,
            statuses,
        };

        info!(
            sources = plan.len(),
            failed = report.failed_sources(),
            records = report.total_records(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Trend aggregation finished"
        );

        report
    }

    async fn run(&self, entry: &PlanEntry) -> Result<Vec<SourceRecord>, SourceError> {
        match tokio::time::timeout(self.timeout, entry.adapter.fetch(&entry.query)).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout {
                source_name: entry.label.clone(),
                timeout_secs: self.timeout.as_secs(),
            }),
        }
    }
}
