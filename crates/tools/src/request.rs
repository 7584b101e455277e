//! Typed tool requests.
//!
//! The oracle's raw argument object is parsed into one [`ToolRequest`]
//! variant per tool. Required parameters that are missing or of the wrong
//! type are rejected; optional ones take the defaults declared in the
//! catalog.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use trendpost_core::error::ToolError;
use trendpost_core::publish::Visibility;
use trendpost_core::source::TimeWindow;

use crate::catalog::{DEFAULT_LIMIT, ToolKind};

/// Upper bound applied to every `limit` argument.
pub const MAX_LIMIT: usize = 50;

fn default_limit() -> usize {
    DEFAULT_LIMIT as usize
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatePostArgs {
    pub content: String,
    #[serde(default)]
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebSearchArgs {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RssArgs {
    pub industry: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HackerNewsArgs {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RedditArgs {
    pub subreddit: String,
    #[serde(default)]
    pub time_filter: TimeWindow,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// `sources_data` is declared as a JSON string; an inline object is
/// accepted too.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeywordArgs {
    sources_data: serde_json::Value,
}

impl KeywordArgs {
    pub fn sources_data(&self) -> String {
        match &self.sources_data {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RelevanceArgs {
    pub topic: String,
    #[serde(default)]
    pub audience: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    CreateLinkedinPost(CreatePostArgs),
    GetProductTrends,
    WebSearchTrends(WebSearchArgs),
    ParseRssFeeds(RssArgs),
    GetHackernewsTrends(HackerNewsArgs),
    GetRedditTrends(RedditArgs),
    AnalyzeTrendingKeywords(KeywordArgs),
    ValidateTopicRelevance(RelevanceArgs),
}

impl ToolRequest {
    /// Resolve `name` in the catalog and bind `arguments` to it.
    pub fn parse(name: &str, arguments: &serde_json::Value) -> Result<Self, ToolError> {
        let kind = ToolKind::from_name(name).ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        let arguments = match arguments {
            serde_json::Value::Null => serde_json::json!({}),
            serde_json::Value::Object(_) => arguments.clone(),
            _ => {
                return Err(ToolError::InvalidArguments {
                    tool_name: name.to_string(),
                    reason: "arguments must be a JSON object".into(),
                });
            }
        };

        let request = match kind {
            ToolKind::CreateLinkedinPost => {
                let args: CreatePostArgs = bind(kind, arguments)?;
                non_empty(kind, "content", &args.content)?;
                Self::CreateLinkedinPost(args)
            }
            ToolKind::GetProductTrends => Self::GetProductTrends,
            ToolKind::WebSearchTrends => {
                let args: WebSearchArgs = bind(kind, arguments)?;
                non_empty(kind, "query", &args.query)?;
                Self::WebSearchTrends(args)
            }
            ToolKind::ParseRssFeeds => {
                let mut args: RssArgs = bind(kind, arguments)?;
                non_empty(kind, "industry", &args.industry)?;
                args.limit = args.limit.min(MAX_LIMIT);
                Self::ParseRssFeeds(args)
            }
            ToolKind::GetHackernewsTrends => {
                let mut args: HackerNewsArgs = bind(kind, arguments)?;
                args.limit = args.limit.min(MAX_LIMIT);
                Self::GetHackernewsTrends(args)
            }
            ToolKind::GetRedditTrends => {
                let mut args: RedditArgs = bind(kind, arguments)?;
                non_empty(kind, "subreddit", &args.subreddit)?;
                args.limit = args.limit.min(MAX_LIMIT);
                Self::GetRedditTrends(args)
            }
            ToolKind::AnalyzeTrendingKeywords => Self::AnalyzeTrendingKeywords(bind(kind, arguments)?),
            ToolKind::ValidateTopicRelevance => {
                let args: RelevanceArgs = bind(kind, arguments)?;
                non_empty(kind, "topic", &args.topic)?;
                Self::ValidateTopicRelevance(args)
            }
        };
        Ok(request)
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            Self::CreateLinkedinPost(_) => ToolKind::CreateLinkedinPost,
            Self::GetProductTrends => ToolKind::GetProductTrends,
            Self::WebSearchTrends(_) => ToolKind::WebSearchTrends,
            Self::ParseRssFeeds(_) => ToolKind::ParseRssFeeds,
            Self::GetHackernewsTrends(_) => ToolKind::GetHackernewsTrends,
            Self::GetRedditTrends(_) => ToolKind::GetRedditTrends,
            Self::AnalyzeTrendingKeywords(_) => ToolKind::AnalyzeTrendingKeywords,
            Self::ValidateTopicRelevance(_) => ToolKind::ValidateTopicRelevance,
        }
    }
}

fn bind<T: DeserializeOwned>(kind: ToolKind, arguments: serde_json::Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool_name: kind.name().to_string(),
        reason: e.to_string(),
    })
}

fn non_empty(kind: ToolKind, param: &str, value: &str) -> Result<(), ToolError> {
    if value.trim().is_empty() {
        return Err(ToolError::InvalidArguments {
            tool_name: kind.name().to_string(),
            reason: format!("'{param}' must not be empty"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use trendpost_core::tool::{ParamDefault, ParamType};

    #[test]
    fn unknown_tool_is_not_found() {
        let err = ToolRequest::parse("launch_rocket", &json!({})).unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: launch_rocket");
    }

    #[test]
    fn missing_required_parameter_is_rejected() {
        let err = ToolRequest::parse("get_reddit_trends", &json!({"limit": 5})).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("get_reddit_trends"));
        assert!(msg.contains("subreddit"));
    }

    #[test]
    fn mistyped_parameter_is_rejected() {
        let err = ToolRequest::parse("get_hackernews_trends", &json!({"limit": "five"})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));

        let err = ToolRequest::parse("get_reddit_trends", &json!({"subreddit": "SaaS", "time_filter": "year"}))
            .unwrap_err();
        assert!(err.to_string().contains("year"));
    }

    #[test]
    fn non_object_arguments_are_rejected() {
        let err = ToolRequest::parse("get_product_trends", &json!("now")).unwrap_err();
        assert!(err.to_string().contains("JSON object"));
        // Missing arguments are the same as an empty object
        assert_eq!(
            ToolRequest::parse("get_product_trends", &serde_json::Value::Null).unwrap(),
            ToolRequest::GetProductTrends
        );
    }

    #[test]
    fn blank_required_string_is_rejected() {
        let err = ToolRequest::parse("validate_topic_relevance", &json!({"topic": "  "})).unwrap_err();
        assert!(err.to_string().contains("'topic' must not be empty"));
    }

    #[test]
    fn defaults_fill_optional_parameters() {
        let req = ToolRequest::parse("get_reddit_trends", &json!({"subreddit": "SaaS"})).unwrap();
        assert_eq!(
            req,
            ToolRequest::GetRedditTrends(RedditArgs {
                subreddit: "SaaS".into(),
                time_filter: TimeWindow::Week,
                limit: 10,
            })
        );

        let req = ToolRequest::parse("create_linkedin_post", &json!({"content": "Hi"})).unwrap();
        match req {
            ToolRequest::CreateLinkedinPost(args) => assert_eq!(args.visibility, Visibility::Public),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn limits_are_capped() {
        let req = ToolRequest::parse("parse_rss_feeds", &json!({"industry": "ai", "limit": 500})).unwrap();
        match req {
            ToolRequest::ParseRssFeeds(args) => assert_eq!(args.limit, MAX_LIMIT),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn keyword_data_accepts_string_or_object() {
        let from_string = ToolRequest::parse(
            "analyze_trending_keywords",
            &json!({"sources_data": "{\"rss\": []}"}),
        )
        .unwrap();
        let from_object =
            ToolRequest::parse("analyze_trending_keywords", &json!({"sources_data": {"rss": []}})).unwrap();
        match (from_string, from_object) {
            (ToolRequest::AnalyzeTrendingKeywords(a), ToolRequest::AnalyzeTrendingKeywords(b)) => {
                assert_eq!(a.sources_data(), "{\"rss\": []}");
                assert_eq!(b.sources_data(), "{\"rss\":[]}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    /// Every declared default must be what parsing an empty optional yields,
    /// and every required parameter must be enforced.
    #[test]
    fn schema_and_binding_agree() {
        let minimal = |kind: ToolKind| {
            let mut args = serde_json::Map::new();
            for p in kind.params().iter().filter(|p| p.required) {
                let value = match (p.name, p.kind) {
                    ("sources_data", _) => json!("{}"),
                    (_, ParamType::String) => json!("x"),
                    (_, ParamType::Integer) => json!(1),
                };
                args.insert(p.name.into(), value);
            }
            serde_json::Value::Object(args)
        };

        for kind in ToolKind::ALL {
            let args = minimal(kind);
            let req = ToolRequest::parse(kind.name(), &args).unwrap();
            assert_eq!(req.kind(), kind);

            for p in kind.params().iter().filter(|p| p.required) {
                let mut without = args.clone();
                without.as_object_mut().unwrap().remove(p.name);
                assert!(
                    ToolRequest::parse(kind.name(), &without).is_err(),
                    "{} accepted a call without {}",
                    kind.name(),
                    p.name
                );
            }

            for p in kind.params() {
                if let Some(ParamDefault::Int(n)) = p.default {
                    assert_eq!(n, DEFAULT_LIMIT, "{}.{}", kind.name(), p.name);
                }
            }
        }
    }
}
