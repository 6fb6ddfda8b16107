//! Command-line interface definitions for News Digest.
//!
//! Every option can also be supplied through an environment variable or a
//! `.env` file in the working directory, and most can be set in the YAML
//! file given with `--config`. Flags win over the file.

use crate::news::Category;
use clap::Parser;

/// Command-line arguments for the News Digest application.
///
/// # Examples
///
/// ```sh
/// # Top US headlines, no AI summaries
/// NEWSAPI_KEY=... news_digest
///
/// # Start with a search and a local summarization server
/// news_digest --query climate --summarizer-url http://127.0.0.1:8080/summarize
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// NewsAPI access key
    #[arg(long, env = "NEWSAPI_KEY", hide_env_values = true)]
    pub newsapi_key: Option<String>,

    /// Optional path to a config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// NewsAPI base URL
    #[arg(long, env = "NEWSAPI_BASE_URL")]
    pub news_base_url: Option<String>,

    /// Two-letter country code for default top headlines
    #[arg(long)]
    pub country: Option<String>,

    /// Summarization server endpoint; AI summaries are disabled without it
    #[arg(long, env = "SUMMARIZER_URL")]
    pub summarizer_url: Option<String>,

    /// Seconds to wait for one summary before giving up
    #[arg(long, env = "SUMMARIZER_TIMEOUT_SECS")]
    pub summarizer_timeout_secs: Option<u64>,

    /// Search for this query on startup
    #[arg(short, long, conflicts_with = "category")]
    pub query: Option<String>,

    /// Load top headlines for this category on startup
    #[arg(long, value_enum)]
    pub category: Option<Category>,
}
