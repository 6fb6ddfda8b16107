//! Data models for NewsAPI responses and validated articles.
//!
//! - [`NewsResponse`] / [`RawArticle`]: the wire shape, every field optional
//! - [`Article`]: a validated record built once at the fetch boundary
//! - [`ResultSet`]: the non-empty, ordered list of articles from one fetch
//!
//! Downstream code only ever sees [`Article`], so field presence is checked
//! exactly once in [`Article::from_raw`].

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Deserialize;

/// Title NewsAPI substitutes for articles that were taken down.
pub const REMOVED_SENTINEL: &str = "[Removed]";

/// Source name shown when the upstream record has none.
pub const UNKNOWN_SOURCE: &str = "Unknown Source";

/// Top-level NewsAPI response body.
///
/// On success `status` is `"ok"` and `articles` is populated; on failure
/// `code` and `message` describe the problem.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsResponse {
    /// `"ok"` or `"error"`.
    pub status: String,
    /// Machine-readable error code, e.g. `"apiKeyInvalid"`.
    pub code: Option<String>,
    /// Human-readable error description.
    pub message: Option<String>,
    /// Total matches upstream, not the number returned.
    pub total_results: Option<u64>,
    /// At most one page of articles. Absent on error responses.
    #[serde(default)]
    pub articles: Vec<RawArticle>,
}

/// Publisher reference inside a [`RawArticle`].
#[derive(Debug, Default, Deserialize)]
pub struct RawSource {
    /// Display name, e.g. `"Reuters"`.
    pub name: Option<String>,
}

/// An article exactly as NewsAPI sends it.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawArticle {
    pub source: Option<RawSource>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    /// Article body, truncated by NewsAPI with a `[+N chars]` marker.
    pub content: Option<String>,
    /// ISO-8601 timestamp as sent; parsed later by [`parse_timestamp`].
    pub published_at: Option<String>,
}

/// A validated news article.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    /// Non-empty headline, never [`REMOVED_SENTINEL`].
    pub title: String,
    /// Short teaser, if NewsAPI sent a non-blank one.
    pub description: Option<String>,
    /// Truncated body, if NewsAPI sent a non-blank one.
    pub content: Option<String>,
    /// Identity of the article within a [`ResultSet`].
    pub url: String,
    /// Publisher name, or [`UNKNOWN_SOURCE`].
    pub source_name: String,
    /// `None` when the upstream timestamp was missing or not RFC 3339.
    pub published_at: Option<DateTime<Utc>>,
}

impl Article {
    /// Validate a raw record.
    ///
    /// Returns `None` unless the title is non-empty and not [`REMOVED_SENTINEL`],
    /// the url is present, and at least one of description/content is present.
    pub fn from_raw(raw: RawArticle) -> Option<Self> {
        let title = non_empty(raw.title)?;
        if title == REMOVED_SENTINEL {
            return None;
        }
        let url = non_empty(raw.url)?;
        let description = non_empty(raw.description);
        let content = non_empty(raw.content);
        if description.is_none() && content.is_none() {
            return None;
        }
        let source_name = raw
            .source
            .and_then(|s| non_empty(s.name))
            .unwrap_or_else(|| UNKNOWN_SOURCE.to_string());
        let published_at = raw.published_at.as_deref().and_then(parse_timestamp);

        Some(Article {
            title,
            description,
            content,
            url,
            source_name,
            published_at,
        })
    }

    /// Text shown under the title on the card.
    pub fn blurb(&self) -> &str {
        self.description
            .as_deref()
            .or(self.content.as_deref())
            .unwrap_or("No description available.")
    }

    /// Body used as summarization input: content if present, else description.
    pub fn body(&self) -> Option<&str> {
        self.content.as_deref().or(self.description.as_deref())
    }

    /// `YYYY-MM-DD HH:MM` in UTC, or `N/A` when the timestamp is unknown.
    pub fn published_display(&self) -> String {
        self.published_at
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }
}

/// Strict RFC 3339 parse; anything else is "unknown".
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|v| !v.trim().is_empty())
}

/// The ordered, non-empty set of valid articles from one fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    articles: Vec<Article>,
}

impl ResultSet {
    /// Validate raw records, keeping upstream order and the first of any
    /// duplicate urls. `None` when nothing survives.
    pub fn from_raw(raw: Vec<RawArticle>) -> Option<Self> {
        let articles = raw
            .into_iter()
            .filter_map(Article::from_raw)
            .unique_by(|a| a.url.clone())
            .collect::<Vec<_>>();
        if articles.is_empty() {
            None
        } else {
            Some(ResultSet { articles })
        }
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    /// Never true for a set built by [`ResultSet::from_raw`].
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Article> {
        self.articles.get(index)
    }

    pub fn find(&self, url: &str) -> Option<&Article> {
        self.articles.iter().find(|a| a.url == url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: Option<&str>, url: Option<&str>, desc: Option<&str>, content: Option<&str>) -> RawArticle {
        RawArticle {
            source: Some(RawSource {
                name: Some("Example Times".to_string()),
            }),
            title: title.map(str::to_string),
            description: desc.map(str::to_string),
            url: url.map(str::to_string),
            content: content.map(str::to_string),
            published_at: Some("2025-05-06T14:30:00Z".to_string()),
        }
    }

    #[test]
    fn test_from_raw_valid() {
        let a = Article::from_raw(raw(Some("T"), Some("https://e.com/1"), Some("D"), None)).unwrap();
        assert_eq!(a.title, "T");
        assert_eq!(a.source_name, "Example Times");
        assert_eq!(a.published_display(), "2025-05-06 14:30");
    }

    #[test]
    fn test_from_raw_rejects_missing_fields() {
        assert!(Article::from_raw(raw(None, Some("https://e.com"), Some("D"), None)).is_none());
        assert!(Article::from_raw(raw(Some(""), Some("https://e.com"), Some("D"), None)).is_none());
        assert!(Article::from_raw(raw(Some("T"), None, Some("D"), None)).is_none());
        assert!(Article::from_raw(raw(Some("T"), Some("https://e.com"), None, None)).is_none());
        assert!(Article::from_raw(raw(Some(REMOVED_SENTINEL), Some("https://e.com"), Some("D"), None)).is_none());
    }

    #[test]
    fn test_from_raw_content_only_is_valid() {
        let a = Article::from_raw(raw(Some("T"), Some("https://e.com"), None, Some("Body"))).unwrap();
        assert_eq!(a.blurb(), "Body");
        assert_eq!(a.body(), Some("Body"));
    }

    #[test]
    fn test_missing_source_name_defaults() {
        let mut r = raw(Some("T"), Some("https://e.com"), Some("D"), None);
        r.source = None;
        assert_eq!(Article::from_raw(r).unwrap().source_name, UNKNOWN_SOURCE);
    }

    #[test]
    fn test_parse_timestamp_strict() {
        assert!(parse_timestamp("2025-05-06T14:30:00Z").is_some());
        assert!(parse_timestamp("2025-05-06T14:30:00+02:00").is_some());
        assert!(parse_timestamp("May 6, 2025").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_unparseable_timestamp_displays_na() {
        let mut r = raw(Some("T"), Some("https://e.com"), Some("D"), None);
        r.published_at = Some("yesterday".to_string());
        assert_eq!(Article::from_raw(r).unwrap().published_display(), "N/A");
    }

    #[test]
    fn test_result_set_filters_in_order() {
        let set = ResultSet::from_raw(vec![
            raw(Some("A"), Some("https://e.com/a"), Some("D"), None),
            raw(None, Some("https://e.com/b"), Some("D"), None),
            raw(Some("C"), Some("https://e.com/c"), None, Some("C body")),
        ])
        .unwrap();
        let titles: Vec<_> = set.articles().iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, ["A", "C"]);
    }

    #[test]
    fn test_result_set_dedupes_urls() {
        let set = ResultSet::from_raw(vec![
            raw(Some("First"), Some("https://e.com/a"), Some("D"), None),
            raw(Some("Second"), Some("https://e.com/a"), Some("D"), None),
        ])
        .unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.find("https://e.com/a").unwrap().title, "First");
    }

    #[test]
    fn test_result_set_none_when_all_invalid() {
        assert!(ResultSet::from_raw(vec![raw(Some(REMOVED_SENTINEL), Some("u"), Some("d"), None)]).is_none());
        assert!(ResultSet::from_raw(vec![]).is_none());
    }

    #[test]
    fn test_news_response_deserialization() {
        let json = r#"{
            "status": "ok",
            "totalResults": 1,
            "articles": [{
                "source": {"id": null, "name": "Wire"},
                "author": null,
                "title": "Hello",
                "description": "World",
                "url": "https://wire.example/hello",
                "urlToImage": null,
                "publishedAt": "2025-01-02T03:04:05Z",
                "content": "Body [+120 chars]"
            }]
        }"#;
        let resp: NewsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.status, "ok");
        assert_eq!(resp.total_results, Some(1));
        assert_eq!(resp.articles.len(), 1);
        assert_eq!(resp.articles[0].published_at.as_deref(), Some("2025-01-02T03:04:05Z"));
    }

    #[test]
    fn test_error_response_deserialization() {
        let json = r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid."}"#;
        let resp: NewsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.code.as_deref(), Some("apiKeyInvalid"));
        assert!(resp.articles.is_empty());
    }
}
