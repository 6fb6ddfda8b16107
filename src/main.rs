//! # News Digest
//!
//! An interactive terminal news reader backed by NewsAPI, with on-demand
//! long-form summaries from a locally served pretrained summarization model.
//!
//! ## Usage
//!
//! ```sh
//! NEWSAPI_KEY=... news_digest --summarizer-url http://127.0.0.1:8080/summarize
//! ```
//!
//! ## Architecture
//!
//! 1. **Startup**: load `.env`, parse flags, resolve and validate [`config::Config`]
//! 2. **Shell**: one task owns the [`app::App`] and reads commands from stdin
//! 3. **Fetching**: each search runs on a background task ([`fetch`]) and reports
//!    back over a bounded channel
//! 4. **Summaries**: each summary request runs on its own task ([`summarize`])
//!    and reports back over the same channel

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod app;
mod browser;
mod cli;
mod config;
mod error;
mod events;
mod fetch;
mod models;
mod news;
mod render;
mod shell;
mod summarize;
#[cfg(test)]
mod test_support;

use app::App;
use browser::SystemOpener;
use cli::Cli;
use config::Config;
use fetch::FetchCoordinator;
use news::{NewsApiClient, NewsQuery};
use summarize::{HttpSummarizer, Summarizer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "Ignoring unreadable .env file"),
    }

    info!("news_digest starting up");
    let args = Cli::parse();
    debug!(?args.config, ?args.query, ?args.category, "Parsed CLI arguments");

    // Missing or malformed credentials are fatal before anything else starts.
    let config = match Config::from_cli(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            eprintln!("FATAL ERROR: {e}");
            return Err(e.into());
        }
    };

    let source = Arc::new(NewsApiClient::new(&config)?);
    let fetcher = FetchCoordinator::new(source, config.api_key.clone());

    let summarizer: Option<Arc<dyn Summarizer>> = match &config.summarizer {
        Some(sc) => match HttpSummarizer::new(sc) {
            Ok(s) => {
                info!(endpoint = %sc.endpoint, "AI summaries enabled");
                Some(Arc::new(s))
            }
            Err(e) => {
                warn!(error = %e, "Could not set up summarizer; AI summaries disabled");
                None
            }
        },
        None => {
            warn!("No summarizer configured; AI summaries disabled");
            None
        }
    };

    let initial = match (args.query, args.category) {
        (Some(q), _) => Some(NewsQuery::Search(q)),
        (None, Some(c)) => Some(NewsQuery::Category(c)),
        (None, None) => None,
    };

    let (tx, rx) = events::channel();
    let app = App::new(fetcher, summarizer, Arc::new(SystemOpener), tx);
    let input = shell::spawn_stdin_reader()?;
    shell::run(app, rx, input, initial).await?;

    info!("news_digest exiting");
    Ok(())
}
