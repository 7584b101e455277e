//! Trend analysis for TrendPost.
//!
//! - [`aggregator`] fans out to several source adapters and ranks recurring terms
//! - [`keywords`] holds the tokenizer and the stable keyword ranking
//! - [`relevance`] scores a candidate topic for freshness and domain fit

pub mod aggregator;
pub mod keywords;
pub mod relevance;

pub use aggregator::{AggregatedTrendReport, PlanEntry, SourceStatus, TrendAggregator, TrendPlan};
pub use keywords::{KeywordAnalysis, KeywordCount, keywords_from_json, rank_keywords, tokenize};
pub use relevance::{RelevanceScore, RelevanceValidator};
