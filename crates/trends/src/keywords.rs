//! Tokenizing and ranking recurring terms.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// How many keywords a ranking returns.
pub const TOP_KEYWORDS: usize = 10;

/// Tokens must be longer than this many characters.
const MIN_TOKEN_CHARS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub word: String,
    pub count: usize,
}

/// Result of ranking keywords over a caller-supplied JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordAnalysis {
    pub top_keywords: Vec<KeywordCount>,
    /// Number of top-level members in the document
    pub total_sources: usize,
}

/// Whitespace-split, purely alphabetic tokens longer than four characters,
/// lower-cased.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .filter(|w| w.chars().count() > MIN_TOKEN_CHARS && w.chars().all(char::is_alphabetic))
        .map(str::to_lowercase)
}

/// Count tokens across `texts` and return the `top` most frequent.
///
/// Ties keep first-occurrence order, so the ranking is deterministic.
pub fn rank_keywords<'a>(texts: impl IntoIterator<Item = &'a str>, top: usize) -> Vec<KeywordCount> {
    let mut order: Vec<KeywordCount> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for text in texts {
        for token in tokenize(text) {
            match index.get(&token) {
                Some(&i) => order[i].count += 1,
                None => {
                    index.insert(token.clone(), order.len());
                    order.push(KeywordCount { word: token, count: 1 });
                }
            }
        }
    }

    order.sort_by(|a, b| b.count.cmp(&a.count));
    order.truncate(top);
    order
}

/// Rank keywords over a JSON object whose array members hold
/// `{title, summary}` items, e.g. a trend report the oracle passes back.
pub fn keywords_from_json(sources_data: &str) -> Result<KeywordAnalysis, String> {
    let value: serde_json::Value =
        serde_json::from_str(sources_data).map_err(|e| format!("sources_data is not valid JSON: {e}"))?;
    let object = value
        .as_object()
        .ok_or_else(|| "sources_data must be a JSON object".to_string())?;

    let texts: Vec<String> = object
        .values()
        .filter_map(|v| v.as_array())
        .flatten()
        .map(|item| {
            let field = |name: &str| item.get(name).and_then(|v| v.as_str()).unwrap_or_default();
            format!("{} {}", field("title"), field("summary"))
        })
        .collect();

    Ok(KeywordAnalysis {
        top_keywords: rank_keywords(texts.iter().map(String::as_str), TOP_KEYWORDS),
        total_sources: object.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(ranking: &[KeywordCount]) -> Vec<&str> {
        ranking.iter().map(|k| k.word.as_str()).collect()
    }

    #[test]
    fn tokenizer_rules() {
        let tokens: Vec<String> = tokenize("Product strategy 2025 AI-first Short tool Métricas").collect();
        assert_eq!(tokens, vec!["product", "strategy", "short", "métricas"]);
    }

    #[test]
    fn ranking_counts_and_orders() {
        let texts = [
            "Pricing pricing experiments",
            "Growth experiments and pricing",
            "Growth loops",
        ];
        let ranking = rank_keywords(texts, 10);
        assert_eq!(ranking[0], KeywordCount { word: "pricing".into(), count: 3 });
        // Tie at 2: "experiments" appeared before "growth"
        assert_eq!(words(&ranking[1..3]), vec!["experiments", "growth"]);
        assert_eq!(ranking[3].word, "loops");
    }

    #[test]
    fn ranking_is_capped() {
        let text = "alpha bravo charlie delta foxtrot golf hotel india juliet kilo lima mike november oscar";
        let ranking = rank_keywords([text], TOP_KEYWORDS);
        assert_eq!(ranking.len(), TOP_KEYWORDS);
        assert!(ranking.iter().all(|k| k.word.chars().count() > 4));
    }

    #[test]
    fn ranking_is_deterministic() {
        let texts = ["Roadmap planning sessions", "Planning roadmap reviews", "Sessions reviews"];
        assert_eq!(rank_keywords(texts, 10), rank_keywords(texts, 10));
    }

    #[test]
    fn empty_input_gives_empty_ranking() {
        assert!(rank_keywords(std::iter::empty::<&str>(), 10).is_empty());
    }

    #[test]
    fn json_analysis() {
        let data = r#"{
            "rss": [{"title": "Retention metrics", "summary": "Cohort retention"}],
            "reddit": [{"title": "Retention loops"}, {"summary": "cohort charts"}],
            "note": "ignored"
        }"#;
        let analysis = keywords_from_json(data).unwrap();
        assert_eq!(analysis.total_sources, 3);
        assert_eq!(analysis.top_keywords[0], KeywordCount { word: "retention".into(), count: 3 });
        assert_eq!(analysis.top_keywords[1], KeywordCount { word: "cohort".into(), count: 2 });
        assert_eq!(analysis.top_keywords.len(), 5);
    }

    #[test]
    fn json_analysis_rejects_bad_input() {
        assert!(keywords_from_json("not json").is_err());
        assert!(keywords_from_json("[1, 2]").unwrap_err().contains("object"));
    }
}
