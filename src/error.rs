//! Error types for configuration, news fetching and summarization.
//!
//! Every variant's `Display` output is the message shown to the user, so
//! the wording here is user-facing rather than developer-facing.

use thiserror::Error;

/// Problems with the startup configuration. Fatal when raised in `main`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("NewsAPI key is missing. Set NEWSAPI_KEY or pass --newsapi-key.")]
    MissingApiKey,

    #[error("NewsAPI key is still the placeholder value. Set a real key from newsapi.org.")]
    PlaceholderApiKey,

    #[error("NewsAPI key looks invalid ({len} characters, expected at least {min}).")]
    ApiKeyTooShort { len: usize, min: usize },

    #[error("Could not read config file {path}: {reason}")]
    File { path: String, reason: String },

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Terminal failure of a single news fetch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Error: The request to NewsAPI timed out. Check connection.")]
    Timeout,

    #[error("Error 401: Invalid NewsAPI key. Please check your configuration.")]
    Unauthorized,

    #[error("Error 429: NewsAPI rate limit reached. Wait and try again later.")]
    RateLimited,

    #[error("Error 426: API usage restriction. Check your NewsAPI plan/request type.")]
    PlanRestricted,

    #[error("Error 400: Bad request for {request}. (API message: {message})")]
    BadRequest { request: String, message: String },

    #[error("Error: HTTP error {status} fetching news.")]
    Http { status: u16 },

    #[error("Error: Could not connect to NewsAPI. Check internet connection/firewall.")]
    Connect,

    #[error("Error: Network or request error: {0}")]
    Network(String),

    #[error("Error: NewsAPI returned a response that could not be decoded: {0}")]
    Decode(String),

    #[error("News API error ({code}): {message}")]
    Api { code: String, message: String },

    #[error("No articles found for {request}. Try different keywords.")]
    NoArticles { request: String },

    #[error("Received news data for {request}, but no valid articles found.")]
    NoValidArticles { request: String },
}

impl FetchError {
    /// Classify a transport-level `reqwest` failure.
    ///
    /// The request URL is stripped first since it carries the API key.
    pub fn from_transport(e: reqwest::Error) -> Self {
        let e = e.without_url();
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_connect() {
            FetchError::Connect
        } else if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Failure to produce a summary. Shown inline in the article's panel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SummaryError {
    #[error("AI model not available. Configure --summarizer-url and restart.")]
    Unavailable,

    #[error("Content too short for a long summary ({len} characters, need at least {min}).")]
    TooShort { len: usize, min: usize },

    #[error("AI Error: Could not generate long summary. (Input text possibly too long for model's internal limits)")]
    InputTooLong,

    #[error("AI Error: Could not generate long summary. (Requested length might exceed model capacity)")]
    LengthTooLong,

    #[error("AI Error: Could not generate long summary. (Memory error - requested length might be too high)")]
    OutOfMemory,

    #[error("AI Error: Summarization model did not return the expected output format.")]
    UnexpectedOutput,

    #[error("AI Error: Could not generate long summary. ({0})")]
    Model(String),

    #[error("AI Error: Could not reach the summarization server. ({0})")]
    Transport(String),
}

impl SummaryError {
    /// Map a model-side error message onto a specific variant.
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("out of memory") {
            SummaryError::OutOfMemory
        } else if lower.contains("maximum sequence length") {
            SummaryError::InputTooLong
        } else if lower.contains("too long") {
            SummaryError::LengthTooLong
        } else {
            SummaryError::Model(message.to_string())
        }
    }
}
