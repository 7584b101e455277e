//! The fixed tool catalog.
//!
//! Each [`ToolKind`] carries its wire name, the description shown to the
//! oracle and its parameter specs. Schemas are generated from the specs, so
//! what the oracle sees and what [`crate::ToolRequest`] accepts cannot drift.

use trendpost_core::provider::ToolDefinition;
use trendpost_core::tool::{ParamDefault, ParamSpec, ParamType, definition};

/// Default `limit` for the listing tools.
pub const DEFAULT_LIMIT: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    CreateLinkedinPost,
    GetProductTrends,
    WebSearchTrends,
    ParseRssFeeds,
    GetHackernewsTrends,
    GetRedditTrends,
    AnalyzeTrendingKeywords,
    ValidateTopicRelevance,
}

const LIMIT: ParamSpec = ParamSpec::optional("limit", ParamType::Integer, "Maximum number of items")
    .with_default(ParamDefault::Int(DEFAULT_LIMIT));

const CREATE_POST_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("content", ParamType::String, "Full text of the post"),
    ParamSpec::optional("visibility", ParamType::String, "Who can see the post")
        .with_choices(&["PUBLIC", "CONNECTIONS"])
        .with_default(ParamDefault::Str("PUBLIC")),
];

const WEB_SEARCH_PARAMS: &[ParamSpec] = &[ParamSpec::required(
    "query",
    ParamType::String,
    "Search query describing the trend to look for",
)];

const RSS_PARAMS: &[ParamSpec] = &[
    ParamSpec::required(
        "industry",
        ParamType::String,
        "Feed category: product_management, technology, marketing, startup or ai",
    ),
    LIMIT,
];

const HACKERNEWS_PARAMS: &[ParamSpec] = &[LIMIT];

const REDDIT_PARAMS: &[ParamSpec] = &[
    ParamSpec::required(
        "subreddit",
        ParamType::String,
        "Community name, e.g. ProductManagement, product_design, SaaS, startups",
    ),
    ParamSpec::optional("time_filter", ParamType::String, "Ranking window")
        .with_choices(&["day", "week", "month"])
        .with_default(ParamDefault::Str("week")),
    LIMIT,
];

const KEYWORD_PARAMS: &[ParamSpec] = &[ParamSpec::required(
    "sources_data",
    ParamType::String,
    "JSON object whose array members hold items with title and summary",
)];

const RELEVANCE_PARAMS: &[ParamSpec] = &[
    ParamSpec::required("topic", ParamType::String, "Candidate post topic"),
    ParamSpec::optional("audience", ParamType::String, "Audience to judge for"),
];

impl ToolKind {
    pub const ALL: [ToolKind; 8] = [
        ToolKind::CreateLinkedinPost,
        ToolKind::GetProductTrends,
        ToolKind::WebSearchTrends,
        ToolKind::ParseRssFeeds,
        ToolKind::GetHackernewsTrends,
        ToolKind::GetRedditTrends,
        ToolKind::AnalyzeTrendingKeywords,
        ToolKind::ValidateTopicRelevance,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::CreateLinkedinPost => "create_linkedin_post",
            ToolKind::GetProductTrends => "get_product_trends",
            ToolKind::WebSearchTrends => "web_search_trends",
            ToolKind::ParseRssFeeds => "parse_rss_feeds",
            ToolKind::GetHackernewsTrends => "get_hackernews_trends",
            ToolKind::GetRedditTrends => "get_reddit_trends",
            ToolKind::AnalyzeTrendingKeywords => "analyze_trending_keywords",
            ToolKind::ValidateTopicRelevance => "validate_topic_relevance",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolKind::CreateLinkedinPost => "Publish a finished post to LinkedIn.",
            ToolKind::GetProductTrends => {
                "Best first step for a product audience: aggregated trends from product feeds \
                 (Mind the Product and others), r/ProductManagement, r/product_design, r/startups \
                 and Hacker News, with the top recurring keywords."
            }
            ToolKind::WebSearchTrends => {
                "Look for current news on a topic. Returns instructions to run your own web search."
            }
            ToolKind::ParseRssFeeds => {
                "Latest articles from the RSS feeds of one category. Use 'product_management' for PM content."
            }
            ToolKind::GetHackernewsTrends => "Current top stories on Hacker News with points and comment counts.",
            ToolKind::GetRedditTrends => {
                "Top discussions of a subreddit. For product topics use ProductManagement, \
                 product_design, SaaS or startups."
            }
            ToolKind::AnalyzeTrendingKeywords => "Rank the most frequent keywords across collected trend data.",
            ToolKind::ValidateTopicRelevance => {
                "Score how fresh and on-domain a topic is for the target audience."
            }
        }
    }

    pub fn params(self) -> &'static [ParamSpec] {
        match self {
            ToolKind::CreateLinkedinPost => CREATE_POST_PARAMS,
            ToolKind::GetProductTrends => &[],
            ToolKind::WebSearchTrends => WEB_SEARCH_PARAMS,
            ToolKind::ParseRssFeeds => RSS_PARAMS,
            ToolKind::GetHackernewsTrends => HACKERNEWS_PARAMS,
            ToolKind::GetRedditTrends => REDDIT_PARAMS,
            ToolKind::AnalyzeTrendingKeywords => KEYWORD_PARAMS,
            ToolKind::ValidateTopicRelevance => RELEVANCE_PARAMS,
        }
    }

    pub fn definition(self) -> ToolDefinition {
        definition(self.name(), self.description(), self.params())
    }
}

/// Definitions for the whole catalog, in catalog order.
pub fn definitions() -> Vec<ToolDefinition> {
    ToolKind::ALL.into_iter().map(ToolKind::definition).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn names_are_unique_and_round_trip() {
        let names: HashSet<&str> = ToolKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names.len(), ToolKind::ALL.len());
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("launch_rocket"), None);
    }

    #[test]
    fn schemas_are_objects_with_required_lists() {
        for def in definitions() {
            assert_eq!(def.input_schema["type"], "object", "{}", def.name);
            assert!(def.input_schema["required"].is_array(), "{}", def.name);
            assert!(!def.description.is_empty());
        }
    }

    #[test]
    fn reddit_schema_matches_declaration() {
        let schema = ToolKind::GetRedditTrends.definition().input_schema;
        assert_eq!(schema["required"], serde_json::json!(["subreddit"]));
        assert_eq!(schema["properties"]["time_filter"]["default"], "week");
        assert_eq!(schema["properties"]["limit"]["default"], DEFAULT_LIMIT);
    }

    #[test]
    fn product_trends_takes_no_parameters() {
        let schema = ToolKind::GetProductTrends.definition().input_schema;
        assert!(schema["properties"].as_object().unwrap().is_empty());
    }
}
