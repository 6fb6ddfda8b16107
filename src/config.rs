//! Runtime configuration.
//!
//! Values come from three layers, highest precedence first:
//! 1. command-line flags and environment variables (see [`crate::cli::Cli`]),
//! 2. an optional YAML file passed with `--config`,
//! 3. built-in defaults.
//!
//! The resolved [`Config`] is built once in `main` and handed by reference to
//! the controller and the collaborators it constructs.

use crate::cli::Cli;
use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

/// Keys shorter than this are rejected without contacting NewsAPI.
pub const MIN_API_KEY_LEN: usize = 30;
/// Value shipped in sample configs; never a real key.
pub const PLACEHOLDER_API_KEY: &str = "YOUR_NEWSAPI_KEY";

pub const DEFAULT_NEWS_BASE_URL: &str = "https://newsapi.org/v2/";
pub const DEFAULT_COUNTRY: &str = "us";
pub const NEWS_REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
pub const DEFAULT_SUMMARIZER_TIMEOUT: Duration = Duration::from_secs(600);

/// Check that a NewsAPI credential is present and minimally well-formed.
pub fn validate_api_key(key: Option<&str>) -> Result<&str, ConfigError> {
    let key = key.map(str::trim).filter(|k| !k.is_empty());
    match key {
        None => Err(ConfigError::MissingApiKey),
        Some(PLACEHOLDER_API_KEY) => Err(ConfigError::PlaceholderApiKey),
        Some(k) if k.chars().count() < MIN_API_KEY_LEN => Err(ConfigError::ApiKeyTooShort {
            len: k.chars().count(),
            min: MIN_API_KEY_LEN,
        }),
        Some(k) => Ok(k),
    }
}

/// Shape of the optional YAML config file. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub newsapi_key: Option<String>,
    pub news_base_url: Option<String>,
    pub country: Option<String>,
    pub summarizer_url: Option<String>,
    pub summarizer_timeout_secs: Option<u64>,
}

impl FileConfig {
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let file_err = |reason: String| ConfigError::File {
            path: path.display().to_string(),
            reason,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| file_err(e.to_string()))?;
        let parsed: FileConfig = serde_yaml::from_str(&raw).map_err(|e| file_err(e.to_string()))?;
        debug!(?parsed.news_base_url, ?parsed.country, "Loaded config file");
        Ok(parsed)
    }
}

/// Where and how to reach the summarization server.
#[derive(Debug, Clone, PartialEq)]
pub struct SummarizerConfig {
    pub endpoint: Url,
    pub timeout: Duration,
}

/// Fully resolved configuration.
#[derive(Clone, PartialEq)]
pub struct Config {
    pub api_key: String,
    pub news_base_url: Url,
    pub country: String,
    pub request_timeout: Duration,
    /// `None` disables AI summaries.
    pub summarizer: Option<SummarizerConfig>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("news_base_url", &self.news_base_url.as_str())
            .field("country", &self.country)
            .field("request_timeout", &self.request_timeout)
            .field("summarizer", &self.summarizer)
            .finish()
    }
}

impl Config {
    /// Resolve from parsed CLI arguments, reading `--config` if given.
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match cli.config.as_deref() {
            Some(path) => FileConfig::load(Path::new(path))?,
            None => FileConfig::default(),
        };
        Self::merge(cli, file)
    }

    /// Merge CLI values over file values over defaults, then validate.
    pub fn merge(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let api_key = cli.newsapi_key.clone().or(file.newsapi_key);
        let api_key = validate_api_key(api_key.as_deref())?.to_string();

        let base = cli
            .news_base_url
            .clone()
            .or(file.news_base_url)
            .unwrap_or_else(|| DEFAULT_NEWS_BASE_URL.to_string());
        let news_base_url = parse_base_url("news_base_url", &base)?;

        let country = cli
            .country
            .clone()
            .or(file.country)
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string())
            .to_lowercase();
        if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::Invalid {
                field: "country",
                reason: format!("expected a two-letter country code, got {country:?}"),
            });
        }

        let timeout = cli
            .summarizer_timeout_secs
            .or(file.summarizer_timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_SUMMARIZER_TIMEOUT);
        let summarizer = match cli.summarizer_url.clone().or(file.summarizer_url) {
            Some(raw) => Some(SummarizerConfig {
                endpoint: Url::parse(&raw).map_err(|e| ConfigError::Invalid {
                    field: "summarizer_url",
                    reason: e.to_string(),
                })?,
                timeout,
            }),
            None => None,
        };

        let config = Config {
            api_key,
            news_base_url,
            country,
            request_timeout: NEWS_REQUEST_TIMEOUT,
            summarizer,
        };
        info!(?config, "Resolved configuration");
        Ok(config)
    }
}

/// Parse a base URL, forcing a trailing slash so `join` appends rather than replaces.
fn parse_base_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&with_slash).map_err(|e| ConfigError::Invalid {
        field,
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Invalid {
            field,
            reason: format!("unsupported scheme {other:?}"),
        }),
    }
}
