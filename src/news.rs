//! NewsAPI client.
//!
//! [`NewsSource`] is the seam the fetch coordinator talks to; in production
//! it is backed by [`NewsApiClient`], in tests by an in-memory fake. The
//! source only runs the HTTP exchange and maps HTTP status codes onto
//! [`FetchError`]. Checking the `status` field and filtering articles is
//! left to [`crate::fetch`].
//!
//! # Endpoints
//!
//! | Query | Endpoint | Extra parameters |
//! |-------|----------|------------------|
//! | [`NewsQuery::TopHeadlines`] | `top-headlines` | `country` |
//! | [`NewsQuery::Category`] | `top-headlines` | `category` |
//! | [`NewsQuery::Search`] | `everything` | `q`, `sortBy=relevancy` |
//!
//! Every request also carries `apiKey`, `pageSize=20` and `language=en`.

use crate::config::Config;
use crate::error::FetchError;
use crate::models::NewsResponse;
use async_trait::async_trait;
use clap::ValueEnum;
use reqwest::Client;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub const PAGE_SIZE: u32 = 20;
pub const LANGUAGE: &str = "en";

/// NewsAPI top-headlines categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Category {
    Business,
    Entertainment,
    General,
    Health,
    Science,
    Sports,
    Technology,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Business,
        Category::Entertainment,
        Category::General,
        Category::Health,
        Category::Science,
        Category::Sports,
        Category::Technology,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Business => "business",
            Category::Entertainment => "entertainment",
            Category::General => "general",
            Category::Health => "health",
            Category::Science => "science",
            Category::Sports => "sports",
            Category::Technology => "technology",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| {
                let names = Category::ALL.map(|c| c.as_str()).join(", ");
                format!("unknown category {s:?} (expected one of: {names})")
            })
    }
}

/// What one fetch asks NewsAPI for. Category and free-text search are
/// mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewsQuery {
    /// Top headlines for the configured country.
    TopHeadlines,
    Category(Category),
    Search(String),
}

impl NewsQuery {
    /// Human-readable description used in error messages.
    pub fn describe(&self, country: &str) -> String {
        match self {
            NewsQuery::TopHeadlines => format!("top headlines for {} (default)", country.to_uppercase()),
            NewsQuery::Category(c) => format!("top headlines for category '{c}'"),
            NewsQuery::Search(q) => format!("everything for query '{q}'"),
        }
    }

    /// Short label for the "Searching for ..." view.
    pub fn label(&self) -> String {
        match self {
            NewsQuery::TopHeadlines => "top headlines".to_string(),
            NewsQuery::Category(c) => c.to_string(),
            NewsQuery::Search(q) => q.clone(),
        }
    }
}

/// Something that can answer a [`NewsQuery`].
#[async_trait]
pub trait NewsSource: Send + Sync + fmt::Debug {
    /// Run exactly one request. HTTP-level failures are already classified.
    async fn fetch(&self, api_key: &str, query: &NewsQuery) -> Result<NewsResponse, FetchError>;

    /// Description of `query` for user-facing messages.
    fn describe(&self, query: &NewsQuery) -> String;
}

/// [`NewsSource`] backed by the public NewsAPI v2 HTTP API.
pub struct NewsApiClient {
    client: Client,
    base_url: Url,
    country: String,
}

impl fmt::Debug for NewsApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsApiClient")
            .field("client", &"<reqwest::Client>")
            .field("base_url", &self.base_url.as_str())
            .field("country", &self.country)
            .finish()
    }
}

impl NewsApiClient {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::from_transport)?;
        Ok(Self {
            client,
            base_url: config.news_base_url.clone(),
            country: config.country.clone(),
        })
    }

    /// Full request URL including query parameters.
    pub fn request_url(&self, api_key: &str, query: &NewsQuery) -> Result<Url, FetchError> {
        let endpoint = match query {
            NewsQuery::Search(_) => "everything",
            NewsQuery::TopHeadlines | NewsQuery::Category(_) => "top-headlines",
        };
        let mut url = self
            .base_url
            .join(endpoint)
            .map_err(|e| FetchError::Network(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("apiKey", api_key)
                .append_pair("pageSize", &PAGE_SIZE.to_string())
                .append_pair("language", LANGUAGE);
            match query {
                NewsQuery::TopHeadlines => {
                    pairs.append_pair("country", &self.country);
                }
                NewsQuery::Category(c) => {
                    pairs.append_pair("category", c.as_str());
                }
                NewsQuery::Search(q) => {
                    pairs.append_pair("q", q).append_pair("sortBy", "relevancy");
                }
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl NewsSource for NewsApiClient {
    #[instrument(level = "info", skip_all, fields(query = ?query))]
    async fn fetch(&self, api_key: &str, query: &NewsQuery) -> Result<NewsResponse, FetchError> {
        let url = self.request_url(api_key, query)?;
        let t0 = Instant::now();
        debug!(endpoint = %url.path(), "Sending NewsAPI request");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_transport)?;
        let status = resp.status();
        let body = resp.text().await.map_err(FetchError::from_transport)?;
        let elapsed_ms = t0.elapsed().as_millis();

        if !status.is_success() {
            warn!(status = status.as_u16(), elapsed_ms, "NewsAPI returned an HTTP error");
            return Err(classify_status(status.as_u16(), &body, &self.describe(query)));
        }

        let parsed: NewsResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))?;
        info!(
            status = %parsed.status,
            total_results = ?parsed.total_results,
            returned = parsed.articles.len(),
            elapsed_ms,
            "NewsAPI response received"
        );
        Ok(parsed)
    }

    fn describe(&self, query: &NewsQuery) -> String {
        query.describe(&self.country)
    }
}

/// Map a non-success HTTP status onto a [`FetchError`].
///
/// For 400 the upstream `message` field is echoed when the body is JSON,
/// otherwise the raw body is.
pub fn classify_status(status: u16, body: &str, request: &str) -> FetchError {
    match status {
        401 => FetchError::Unauthorized,
        429 => FetchError::RateLimited,
        426 => FetchError::PlanRestricted,
        400 => {
            let message = serde_json::from_str::<NewsResponse>(body)
                .ok()
                .and_then(|r| r.message)
                .unwrap_or_else(|| body.trim().to_string());
            FetchError::BadRequest {
                request: request.to_string(),
                message,
            }
        }
        other => FetchError::Http { status: other },
    }
}
