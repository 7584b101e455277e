//! Tool dispatch.
//!
//! [`ToolDispatcher`] binds each call to a [`ToolRequest`] and runs it
//! against the collaborators in a [`ToolContext`]. Every outcome, including
//! unknown tools and bad arguments, comes back as a [`ToolResult`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn};
use trendpost_config::AppConfig;
use trendpost_core::error::ToolError;
use trendpost_core::provider::ToolDefinition;
use trendpost_core::publish::Publisher;
use trendpost_core::source::{SourceAdapter, SourceQuery, SourceRecord};
use trendpost_core::tool::{ToolCall, ToolExecutor, ToolResult};
use trendpost_sources::SourceSet;
use trendpost_trends::{RelevanceValidator, TrendAggregator, TrendPlan, keywords_from_json};

use crate::catalog::{ToolKind, definitions};
use crate::request::{
    CreatePostArgs, HackerNewsArgs, KeywordArgs, RedditArgs, RelevanceArgs, RssArgs, ToolRequest, WebSearchArgs,
};

/// Everything the tools reach out to.
#[derive(Clone)]
pub struct ToolContext {
    pub rss: Arc<dyn SourceAdapter>,
    pub hackernews: Arc<dyn SourceAdapter>,
    pub reddit: Arc<dyn SourceAdapter>,
    /// Sources behind `get_product_trends`
    pub product_plan: TrendPlan,
    pub aggregator: Arc<TrendAggregator>,
    pub validator: Arc<RelevanceValidator>,
    pub publisher: Arc<dyn Publisher>,
}

impl ToolContext {
    pub fn from_config(config: &AppConfig) -> trendpost_core::Result<Self> {
        let sources = SourceSet::from_config(&config.sources)?;
        let publisher = trendpost_publisher::from_config(&config.publish)?;
        Ok(Self {
            product_plan: TrendPlan::product(&sources, &config.sources),
            rss: sources.rss,
            hackernews: sources.hackernews,
            reddit: sources.reddit,
            aggregator: Arc::new(TrendAggregator::new(Duration::from_secs(config.sources.timeout_secs))),
            validator: Arc::new(RelevanceValidator::from_settings(&config.agent)),
            publisher,
        })
    }
}

pub struct ToolDispatcher {
    context: ToolContext,
}

impl ToolDispatcher {
    pub fn new(context: ToolContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &ToolContext {
        &self.context
    }

    async fn execute(&self, request: ToolRequest) -> Result<serde_json::Value, ToolError> {
        match request {
            ToolRequest::CreateLinkedinPost(args) => self.create_post(args).await,
            ToolRequest::GetProductTrends => Ok(self.product_trends().await),
            ToolRequest::WebSearchTrends(args) => Ok(web_search(args)),
            ToolRequest::ParseRssFeeds(args) => self.rss_feeds(args).await,
            ToolRequest::GetHackernewsTrends(args) => self.hackernews(args).await,
            ToolRequest::GetRedditTrends(args) => self.reddit(args).await,
            ToolRequest::AnalyzeTrendingKeywords(args) => analyze_keywords(args),
            ToolRequest::ValidateTopicRelevance(args) => self.validate(args),
        }
    }

    async fn create_post(&self, args: CreatePostArgs) -> Result<serde_json::Value, ToolError> {
        let publisher = &self.context.publisher;
        let receipt = publisher
            .publish(&args.content, args.visibility)
            .await
            .map_err(|e| failed(ToolKind::CreateLinkedinPost, e))?;

        let message = if receipt.dry_run {
            "Dry run: the post was accepted but not sent to LinkedIn"
        } else {
            "Post published to LinkedIn"
        };
        Ok(serde_json::json!({
            "post_id": receipt.post_id,
            "dry_run": receipt.dry_run,
            "visibility": args.visibility,
            "message": message,
        }))
    }

    async fn product_trends(&self) -> serde_json::Value {
        let report = self.context.aggregator.aggregate(&self.context.product_plan).await;

        let in_category = |category: &str| -> Vec<&SourceRecord> {
            report
                .records
                .iter()
                .filter(|r| r.category.as_deref() == Some(category))
                .collect()
        };
        let count = |category: &str| report.source_counts.get(category).copied().unwrap_or(0);

        let summary = format!(
            "Collected {} items from {} sources, {} failed",
            report.total_records(),
            report.statuses.len(),
            report.failed_sources()
        );

        serde_json::json!({
            "sources": {
                "rss_count": count("rss"),
                "reddit_count": count("reddit"),
                "hn_count": count("hackernews"),
            },
            "data": {
                "rss_articles": in_category("rss"),
                "reddit_discussions": in_category("reddit"),
                "hn_stories": in_category("hackernews"),
            },
            "trending_keywords": report.keywords,
            "statuses": report.statuses,
            "summary": summary,
        })
    }

    async fn rss_feeds(&self, args: RssArgs) -> Result<serde_json::Value, ToolError> {
        let query = SourceQuery::feeds(&args.industry, args.limit);
        let articles = fetch(&self.context.rss, ToolKind::ParseRssFeeds, &query).await?;
        Ok(serde_json::json!({
            "industry": args.industry,
            "total": articles.len(),
            "articles": articles,
        }))
    }

    async fn hackernews(&self, args: HackerNewsArgs) -> Result<serde_json::Value, ToolError> {
        let query = SourceQuery::top_stories(args.limit);
        let stories = fetch(&self.context.hackernews, ToolKind::GetHackernewsTrends, &query).await?;
        Ok(serde_json::json!({
            "source": "Hacker News",
            "total": stories.len(),
            "stories": stories,
        }))
    }

    async fn reddit(&self, args: RedditArgs) -> Result<serde_json::Value, ToolError> {
        let query = SourceQuery::community(&args.subreddit, args.time_filter, args.limit);
        let posts = fetch(&self.context.reddit, ToolKind::GetRedditTrends, &query).await?;
        Ok(serde_json::json!({
            "subreddit": args.subreddit,
            "total": posts.len(),
            "posts": posts,
        }))
    }

    fn validate(&self, args: RelevanceArgs) -> Result<serde_json::Value, ToolError> {
        let score = self.context.validator.score(&args.topic, args.audience.as_deref());
        serde_json::to_value(score).map_err(|e| failed(ToolKind::ValidateTopicRelevance, e))
    }
}

#[async_trait]
impl ToolExecutor for ToolDispatcher {
    fn definitions(&self) -> Vec<ToolDefinition> {
        definitions()
    }

    async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        let started = Instant::now();
        let outcome = match ToolRequest::parse(&call.name, &call.arguments) {
            Ok(request) => {
                debug!(tool = %call.name, call_id = %call.id, "Executing tool");
                self.execute(request).await
            }
            Err(e) => Err(e),
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(payload) => {
                info!(tool = %call.name, call_id = %call.id, duration_ms, "Tool succeeded");
                ToolResult::ok(&call.id, payload)
            }
            Err(e) => {
                warn!(tool = %call.name, call_id = %call.id, duration_ms, error = %e, "Tool failed");
                ToolResult::failure(&call.id, e.to_string())
            }
        }
    }
}

async fn fetch(
    adapter: &Arc<dyn SourceAdapter>,
    kind: ToolKind,
    query: &SourceQuery,
) -> Result<Vec<SourceRecord>, ToolError> {
    adapter.fetch(query).await.map_err(|e| failed(kind, e))
}

fn web_search(args: WebSearchArgs) -> serde_json::Value {
    serde_json::json!({
        "query": args.query,
        "instruction": format!(
            "Use your built-in web search to find the latest news on '{}' and cite the sources you use.",
            args.query
        ),
        "message": "Search delegated to the assistant",
    })
}

fn analyze_keywords(args: KeywordArgs) -> Result<serde_json::Value, ToolError> {
    let analysis = keywords_from_json(&args.sources_data()).map_err(|reason| ToolError::InvalidArguments {
        tool_name: ToolKind::AnalyzeTrendingKeywords.name().to_string(),
        reason,
    })?;
    serde_json::to_value(analysis).map_err(|e| failed(ToolKind::AnalyzeTrendingKeywords, e))
}

fn failed(kind: ToolKind, error: impl std::fmt::Display) -> ToolError {
    ToolError::ExecutionFailed {
        tool_name: kind.name().to_string(),
        reason: error.to_string(),
    }
}
