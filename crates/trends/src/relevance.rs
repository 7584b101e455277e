//! Topic relevance scoring.
//!
//! A topic starts at [`BASE_SCORE`], gains [`FRESHNESS_BONUS`] when it
//! mentions a recency marker and [`INDUSTRY_BONUS`] when it names the
//! configured industry. Scores are capped at 100; [`THRESHOLD`] passes.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use trendpost_config::AgentSettings;

pub const BASE_SCORE: u8 = 75;
pub const FRESHNESS_BONUS: u8 = 15;
pub const INDUSTRY_BONUS: u8 = 10;
pub const THRESHOLD: u8 = 70;

const RECENCY_WORDS: &[&str] = &["latest", "breakthrough", "trend", "today", "новый", "сегодня"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceScore {
    pub topic: String,
    #[serde(rename = "relevance_score")]
    pub score: u8,
    #[serde(rename = "is_relevant")]
    pub passes: bool,
    pub recommendation: String,
    #[serde(rename = "target_audience")]
    pub audience: String,
}

#[derive(Debug, Clone)]
pub struct RelevanceValidator {
    industry: String,
    default_audience: String,
    markers: Vec<String>,
}

impl RelevanceValidator {
    /// Recency markers are the current and previous year of `reference_year`
    /// plus a fixed word list.
    pub fn new(industry: impl Into<String>, default_audience: impl Into<String>, reference_year: i32) -> Self {
        let mut markers = vec![reference_year.to_string(), (reference_year - 1).to_string()];
        markers.extend(RECENCY_WORDS.iter().map(|w| w.to_string()));
        Self {
            industry: industry.into().to_lowercase(),
            default_audience: default_audience.into(),
            markers,
        }
    }

    pub fn from_settings(settings: &AgentSettings) -> Self {
        Self::new(&settings.industry, &settings.target_audience, Utc::now().year())
    }

    pub fn industry(&self) -> &str {
        &self.industry
    }

    pub fn score(&self, topic: &str, audience: Option<&str>) -> RelevanceScore {
        let lowered = topic.to_lowercase();
        let fresh = self.markers.iter().any(|m| lowered.contains(m.as_str()));
        let on_domain = !self.industry.is_empty() && lowered.contains(&self.industry);

        let mut score = BASE_SCORE;
        if fresh {
            score += FRESHNESS_BONUS;
        }
        if on_domain {
            score += INDUSTRY_BONUS;
        }
        let score = score.min(100);
        let passes = score >= THRESHOLD;

        let recommendation = if passes {
            "Strong topic, go ahead and draft the post."
        } else {
            "Look for a fresher angle closer to the audience's domain."
        };

        RelevanceScore {
            topic: topic.to_string(),
            score,
            passes,
            recommendation: recommendation.into(),
            audience: audience
                .filter(|a| !a.trim().is_empty())
                .unwrap_or(&self.default_audience)
                .to_string(),
        }
    }
}
