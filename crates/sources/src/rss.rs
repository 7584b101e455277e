//! RSS 2.0 / Atom feed adapter.
//!
//! Feeds are grouped by category in configuration. A query names a category;
//! every feed of that category is fetched, the first few entries of each are
//! kept, and the merged list is sorted newest first.
//!
//! Parsing is tolerant: it only looks for the handful of elements we need
//! (`item`/`entry`, `title`, `link`, `description`/`summary`, a date) and
//! fills anything missing with defaults.

use std::collections::BTreeMap;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use regex_lite::Regex;
use tracing::{debug, warn};
use trendpost_config::SourcesConfig;
use trendpost_core::error::SourceError;
use trendpost_core::source::{SourceAdapter, SourceQuery, SourceRecord};

use crate::http;

const SUMMARY_CHARS: usize = 200;

struct FeedPatterns {
    item: Regex,
    entry: Regex,
    title: Regex,
    link: Regex,
    link_href: Regex,
    description: Regex,
    summary: Regex,
    content: Regex,
    pub_date: Regex,
    published: Regex,
    updated: Regex,
    dc_date: Regex,
    cdata: Regex,
    tag: Regex,
    numeric_entity: Regex,
}

fn element(name: &str) -> Regex {
    Regex::new(&format!(r"(?is)<{name}(?:\s[^>]*)?>(.*?)</{name}>")).expect("Invalid regex")
}

static PATTERNS: LazyLock<FeedPatterns> = LazyLock::new(|| FeedPatterns {
    item: element("item"),
    entry: element("entry"),
    title: element("title"),
    link: element("link"),
    link_href: Regex::new(r#"(?is)<link\b[^>]*?\bhref\s*=\s*["']([^"']*)["']"#).expect("Invalid regex"),
    description: element("description"),
    summary: element("summary"),
    content: element("content"),
    pub_date: element("pubDate"),
    published: element("published"),
    updated: element("updated"),
    dc_date: element("dc:date"),
    cdata: Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("Invalid regex"),
    tag: Regex::new(r"(?s)<[^>]*>").expect("Invalid regex"),
    numeric_entity: Regex::new(r"&#(x[0-9a-fA-F]+|[0-9]+);").expect("Invalid regex"),
});

/// A parsed feed document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFeed {
    /// Channel / feed title, if the document has one
    pub title: Option<String>,
    pub entries: Vec<FeedEntry>,
}

/// One `item` (RSS) or `entry` (Atom).
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published: NaiveDate,
}

/// Parse an RSS or Atom document, keeping at most `max_entries` entries.
///
/// Entries without a readable date get `today`.
pub fn parse_feed(document: &str, max_entries: usize, today: NaiveDate) -> ParsedFeed {
    let p = &*PATTERNS;

    let blocks: Vec<&str> = {
        let items: Vec<&str> = captures(&p.item, document).collect();
        if items.is_empty() {
            captures(&p.entry, document).collect()
        } else {
            items
        }
    };

    // The feed title is the first <title> before any entry.
    let header_end = blocks
        .first()
        .and_then(|b| document.find(b))
        .unwrap_or(document.len());
    let title = first(&p.title, &document[..header_end]).filter(|t| !t.is_empty());

    let entries = blocks
        .into_iter()
        .take(max_entries)
        .map(|block| parse_entry(block, today))
        .collect();

    ParsedFeed { title, entries }
}

fn parse_entry(block: &str, today: NaiveDate) -> FeedEntry {
    let p = &*PATTERNS;

    let link = first(&p.link, block)
        .filter(|l| !l.is_empty())
        .or_else(|| {
            p.link_href
                .captures(block)
                .and_then(|c| c.get(1))
                .map(|m| decode_entities(m.as_str().trim()))
        })
        .unwrap_or_default();

    let summary = first(&p.description, block)
        .or_else(|| first(&p.summary, block))
        .or_else(|| first(&p.content, block))
        .unwrap_or_default();

    let published = [&p.pub_date, &p.published, &p.updated, &p.dc_date]
        .into_iter()
        .find_map(|re| first(re, block))
        .and_then(|raw| parse_date(&raw))
        .unwrap_or(today);

    FeedEntry {
        title: first(&p.title, block).unwrap_or_default(),
        link,
        summary: http::truncate_chars(&summary, SUMMARY_CHARS),
        published,
    }
}

fn captures<'a>(re: &'a Regex, text: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    re.captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
}

/// Cleaned text of the first match of `re` in `text`.
fn first(re: &Regex, text: &str) -> Option<String> {
    captures(re, text).next().map(clean_text)
}

/// Unwrap CDATA, decode entities, strip markup and collapse whitespace.
fn clean_text(raw: &str) -> String {
    let p = &*PATTERNS;
    let unwrapped = p.cdata.replace_all(raw, "$1");
    let decoded = decode_entities(&unwrapped);
    let stripped = p.tag.replace_all(&decoded, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    ("&rsquo;", "\u{2019}"),
    ("&lsquo;", "\u{2018}"),
    ("&rdquo;", "\u{201D}"),
    ("&ldquo;", "\u{201C}"),
    ("&hellip;", "\u{2026}"),
    ("&mdash;", "\u{2014}"),
    ("&ndash;", "\u{2013}"),
    ("&amp;", "&"),
];

fn decode_entities(text: &str) -> String {
    let numeric = PATTERNS.numeric_entity.replace_all(text, |caps: &regex_lite::Captures<'_>| {
        let raw = &caps[1];
        let code = match raw.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => raw.parse().ok(),
        };
        code.and_then(char::from_u32).map(String::from).unwrap_or_default()
    });
    // `&amp;` goes last so "&amp;lt;" stays literal
    NAMED_ENTITIES
        .iter()
        .fold(numeric.into_owned(), |text, (entity, plain)| text.replace(entity, plain))
}

/// RFC 2822 (RSS `pubDate`) or RFC 3339 (Atom), as a UTC calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok())
}

/// Fetches every feed of a category and merges their entries.
pub struct RssAdapter {
    client: reqwest::Client,
    feeds: BTreeMap<String, Vec<String>>,
    default_category: String,
    entries_per_feed: usize,
    timeout: Duration,
}

impl RssAdapter {
    pub fn new(config: &SourcesConfig) -> Result<Self, SourceError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        Ok(Self {
            client: http::build_client(&config.user_agent, timeout)?,
            feeds: config.feeds.clone(),
            default_category: config.default_feed_category.clone(),
            entries_per_feed: config.entries_per_feed,
            timeout,
        })
    }

    /// Feed URLs for `category`. Unknown categories use the default one.
    pub fn feeds_for(&self, category: &str) -> &[String] {
        let key = category.trim().to_lowercase().replace([' ', '-'], "_");
        self.feeds
            .get(&key)
            .or_else(|| self.feeds.get(&self.default_category))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    async fn fetch_feed(&self, url: &str, today: NaiveDate) -> Result<Vec<SourceRecord>, SourceError> {
        let document = http::get_text(&self.client, url, "rss", self.timeout).await?;
        let feed = parse_feed(&document, self.entries_per_feed, today);
        let label = feed.title.unwrap_or_else(|| url.to_string());

        Ok(feed
            .entries
            .into_iter()
            .map(|e| SourceRecord {
                title: e.title,
                link: e.link,
                summary: e.summary,
                published: e.published,
                source: label.clone(),
                score: None,
                comments: None,
                category: None,
            })
            .collect())
    }
}

#[async_trait]
impl SourceAdapter for RssAdapter {
    fn name(&self) -> &str {
        "rss"
    }

    async fn fetch(&self, query: &SourceQuery) -> Result<Vec<SourceRecord>, SourceError> {
        let category = query.category.as_deref().ok_or_else(|| SourceError::MissingParameter {
            source_name: "rss".into(),
            param: "industry".into(),
        })?;
        let urls = self.feeds_for(category);
        let today = Utc::now().date_naive();

        let fetches = urls.iter().map(|url| self.fetch_feed(url, today));
        let outcomes = futures::future::join_all(fetches).await;

        let mut records = Vec::new();
        let mut failures = 0usize;
        for (url, outcome) in urls.iter().zip(outcomes) {
            match outcome {
                Ok(mut batch) => {
                    debug!(feed = %url, entries = batch.len(), "Feed parsed");
                    records.append(&mut batch);
                }
                Err(e) => {
                    warn!(feed = %url, error = %e, "Skipping feed");
                    failures += 1;
                }
            }
        }

        if failures > 0 && failures == urls.len() {
            return Err(SourceError::Request {
                source_name: "rss".into(),
                reason: format!("all {failures} feeds for '{category}' failed"),
            });
        }

        // Stable: equal dates keep feed order.
        records.sort_by(|a, b| b.published.cmp(&a.published));
        records.truncate(query.limit);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::test_server;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel>
  <title>Mind the Product</title>
  <link>https://www.mindtheproduct.com</link>
  <item>
    <title><![CDATA[Roadmaps &amp; outcomes]]></title>
    <link>https://www.mindtheproduct.com/roadmaps</link>
    <description>&lt;p&gt;Why &lt;b&gt;outcome&lt;/b&gt; roadmaps win&lt;/p&gt;</description>
    <pubDate>Tue, 04 Mar 2025 09:30:00 +0000</pubDate>
  </item>
  <item>
    <title>Pricing experiments</title>
    <link>https://www.mindtheproduct.com/pricing</link>
    <description>Short</description>
    <pubDate>not a date</pubDate>
  </item>
</channel></rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="text">Product Talk</title>
  <entry>
    <title>Continuous discovery habits</title>
    <link rel="alternate" href="https://www.producttalk.org/discovery"/>
    <summary type="html">Interview &#8220;weekly&#8221;</summary>
    <updated>2025-02-28T23:10:00-05:00</updated>
  </entry>
</feed>"#;

    #[test]
    fn parses_rss_items() {
        let feed = parse_feed(RSS, 5, day(2025, 6, 1));
        assert_eq!(feed.title.as_deref(), Some("Mind the Product"));
        assert_eq!(feed.entries.len(), 2);

        let first = &feed.entries[0];
        assert_eq!(first.title, "Roadmaps & outcomes");
        assert_eq!(first.link, "https://www.mindtheproduct.com/roadmaps");
        assert_eq!(first.summary, "Why outcome roadmaps win");
        assert_eq!(first.published, day(2025, 3, 4));

        // Unreadable date falls back to today
        assert_eq!(feed.entries[1].published, day(2025, 6, 1));
    }

    #[test]
    fn parses_atom_entries() {
        let feed = parse_feed(ATOM, 5, day(2025, 6, 1));
        assert_eq!(feed.title.as_deref(), Some("Product Talk"));
        let entry = &feed.entries[0];
        assert_eq!(entry.link, "https://www.producttalk.org/discovery");
        assert_eq!(entry.summary, "Interview \u{201c}weekly\u{201d}");
        // 23:10 at -05:00 is already March 1st in UTC
        assert_eq!(entry.published, day(2025, 3, 1));
    }

    #[test]
    fn entry_cap_and_summary_truncation() {
        let long = "word ".repeat(100);
        let items: String = (0..8)
            .map(|i| format!("<item><title>Item {i}</title><description>{long}</description></item>"))
            .collect();
        let doc = format!("<rss><channel><title>T</title>{items}</channel></rss>");

        let feed = parse_feed(&doc, 5, day(2025, 1, 1));
        assert_eq!(feed.entries.len(), 5);
        assert_eq!(feed.entries[4].title, "Item 4");
        assert!(feed.entries[0].summary.chars().count() <= SUMMARY_CHARS);
    }

    #[test]
    fn named_entities_are_decoded() {
        assert_eq!(
            clean_text("Roadmaps&rsquo; limits &mdash; what&hellip; &ldquo;now&rdquo; &amp;lt;"),
            "Roadmaps\u{2019} limits \u{2014} what\u{2026} \u{201C}now\u{201D} &lt;"
        );
        assert_eq!(clean_text("Discovery&nbsp;&ndash;&nbsp;&#8217;24"), "Discovery \u{2013} \u{2019}24");
    }

    #[test]
    fn garbage_document_yields_no_entries() {
        let feed = parse_feed("<html><body>Service unavailable</body></html>", 5, day(2025, 1, 1));
        assert!(feed.entries.is_empty());
        assert!(feed.title.is_none());
    }

    #[test]
    fn date_formats() {
        assert_eq!(parse_date("Mon, 10 Mar 2025 12:00:00 GMT"), Some(day(2025, 3, 10)));
        assert_eq!(parse_date("2025-03-10T08:00:00Z"), Some(day(2025, 3, 10)));
        assert_eq!(parse_date("2025-03-10"), Some(day(2025, 3, 10)));
        assert_eq!(parse_date("yesterday"), None);
    }

    fn adapter_for(base: &str, urls: &[&str]) -> RssAdapter {
        let mut config = SourcesConfig::default();
        config.feeds = BTreeMap::from([
            ("technology".to_string(), vec![format!("{base}/tech.xml")]),
            (
                "product_management".to_string(),
                urls.iter().map(|u| format!("{base}{u}")).collect(),
            ),
        ]);
        config.timeout_secs = 5;
        RssAdapter::new(&config).unwrap()
    }

    #[test]
    fn unknown_category_uses_default() {
        let adapter = adapter_for("http://localhost", &["/a.xml"]);
        assert_eq!(adapter.feeds_for("Product Management"), ["http://localhost/a.xml"]);
        assert_eq!(adapter.feeds_for("gardening"), ["http://localhost/tech.xml"]);
    }

    #[tokio::test]
    async fn failed_feed_is_skipped_and_results_sorted() {
        let routes = test_server::Routes::from([
            ("/mtp.xml".to_string(), (200, RSS.to_string())),
            ("/pt.xml".to_string(), (200, ATOM.to_string())),
        ]);
        let base = test_server::serve(routes).await;
        let adapter = adapter_for(&base, &["/mtp.xml", "/down.xml", "/pt.xml"]);

        let records = adapter
            .fetch(&SourceQuery::feeds("product_management", 2))
            .await
            .unwrap();

        assert_eq!(records.len(), 2);
        // Undated item got today's date, so it sorts first
        assert_eq!(records[0].title, "Pricing experiments");
        assert_eq!(records[1].title, "Roadmaps & outcomes");
        assert_eq!(records[1].source, "Mind the Product");
    }

    #[tokio::test]
    async fn every_feed_failing_is_an_error() {
        let base = test_server::serve(test_server::Routes::new()).await;
        let adapter = adapter_for(&base, &["/a.xml", "/b.xml"]);
        let err = adapter
            .fetch(&SourceQuery::feeds("product_management", 10))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("all 2 feeds"));
    }

    #[tokio::test]
    async fn missing_category_is_rejected() {
        let adapter = adapter_for("http://localhost", &[]);
        let err = adapter.fetch(&SourceQuery::top_stories(5)).await.unwrap_err();
        assert!(matches!(err, SourceError::MissingParameter { .. }));
    }
}
