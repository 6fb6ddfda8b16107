//! Long-form article summarization through a pretrained model.
//!
//! The model itself is served out of process (any server speaking the
//! Hugging Face inference wire shape for the `summarization` task, e.g. a
//! local `bart-large-cnn` deployment). This module covers:
//!
//! - [`Summarizer`]: the seam the controller calls through
//! - [`HttpSummarizer`]: the HTTP implementation
//! - [`generate_summary`]: input checks, fixed parameters and output cleanup
//!   shared by every implementation
//!
//! # Parameters
//!
//! Every call uses [`SummaryParams::LONG`]: 400–800 output tokens, length
//! penalty 2.5, no repeated trigrams, greedy decoding. Pushing a news
//! summarizer that far past its usual output length can produce repetitive
//! text; the parameters are fixed regardless.

use crate::config::SummarizerConfig;
use crate::error::SummaryError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;
use std::time::Instant;
use tracing::{info, instrument, warn};
use url::Url;

/// Inputs shorter than this (in characters, after trimming) are rejected
/// without calling the model.
pub const MIN_INPUT_CHARS: usize = 150;

/// Marker NewsAPI appends to truncated `content`, e.g. `"... [+120 chars]"`.
pub const TRUNCATION_MARKER: &str = "[+";

/// Generation settings sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SummaryParams {
    pub min_length: u32,
    pub max_length: u32,
    pub length_penalty: f32,
    pub no_repeat_ngram_size: u32,
    pub do_sample: bool,
}

impl SummaryParams {
    pub const LONG: SummaryParams = SummaryParams {
        min_length: 400,
        max_length: 800,
        length_penalty: 2.5,
        no_repeat_ngram_size: 3,
        do_sample: false,
    };
}

/// A text-in, summary-out model.
#[async_trait]
pub trait Summarizer: Send + Sync + fmt::Debug {
    async fn summarize(&self, text: &str, params: &SummaryParams) -> Result<String, SummaryError>;
}

/// Cut everything from the last truncation marker on and trim.
pub fn strip_truncation_marker(body: &str) -> &str {
    match body.rfind(TRUNCATION_MARKER) {
        Some(idx) => body[..idx].trim(),
        None => body.trim(),
    }
}

static SPACE_BEFORE_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([.,])").expect("static regex is valid"));

/// Remove tokenizer artifacts such as `"word ."` from model output.
pub fn clean_output(text: &str) -> String {
    SPACE_BEFORE_PUNCT.replace_all(text.trim(), "$1").into_owned()
}

/// Validate `text`, run the model with [`SummaryParams::LONG`] and clean up
/// the result.
#[instrument(level = "info", skip_all, fields(chars = text.chars().count()))]
pub async fn generate_summary(summarizer: &dyn Summarizer, text: &str) -> Result<String, SummaryError> {
    let text = text.trim();
    let len = text.chars().count();
    if len < MIN_INPUT_CHARS {
        return Err(SummaryError::TooShort {
            len,
            min: MIN_INPUT_CHARS,
        });
    }

    let params = SummaryParams::LONG;
    info!(
        min_tokens = params.min_length,
        max_tokens = params.max_length,
        penalty = params.length_penalty,
        "Requesting long summary"
    );
    let t0 = Instant::now();
    let raw = summarizer.summarize(text, &params).await?;
    let summary = clean_output(&raw);
    if summary.is_empty() {
        return Err(SummaryError::UnexpectedOutput);
    }

    let words = summary.split_whitespace().count();
    info!(words, elapsed_ms = t0.elapsed().as_millis(), "Summary generated");
    Ok(summary)
}

/// [`Summarizer`] that POSTs to a summarization inference server.
pub struct HttpSummarizer {
    client: Client,
    endpoint: Url,
}

impl fmt::Debug for HttpSummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSummarizer")
            .field("client", &"<reqwest::Client>")
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

impl HttpSummarizer {
    pub fn new(config: &SummarizerConfig) -> Result<Self, SummaryError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SummaryError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    #[instrument(level = "info", skip_all, fields(endpoint = %self.endpoint))]
    async fn summarize(&self, text: &str, params: &SummaryParams) -> Result<String, SummaryError> {
        let body = json!({ "inputs": text, "parameters": params });
        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;
        let status = resp.status();
        let body = resp.text().await.map_err(transport_error)?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Summarization server returned an error");
            return Err(failure_from_reply(status.as_u16(), &body));
        }
        let payload: Value =
            serde_json::from_str(&body).map_err(|_| SummaryError::UnexpectedOutput)?;
        parse_response(&payload).inspect_err(|e| warn!(error = %e, "Summarization failed"))
    }
}

/// Error for a non-success reply. A JSON `{"error": ..}` body is classified;
/// anything else reports the HTTP status.
fn failure_from_reply(status: u16, body: &str) -> SummaryError {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|payload| parse_response(&payload).err())
        .filter(|e| *e != SummaryError::UnexpectedOutput)
        .unwrap_or_else(|| SummaryError::Model(format!("HTTP {status}")))
}

fn transport_error(e: reqwest::Error) -> SummaryError {
    if e.is_timeout() {
        SummaryError::Transport("request timed out".to_string())
    } else if e.is_connect() {
        SummaryError::Unavailable
    } else {
        SummaryError::Transport(e.without_url().to_string())
    }
}

/// Interpret a server reply: `[{"summary_text": ".."}]` on success,
/// `{"error": ".."}` on failure.
pub fn parse_response(payload: &Value) -> Result<String, SummaryError> {
    if let Some(message) = payload.get("error").and_then(Value::as_str) {
        return Err(SummaryError::classify(message));
    }
    payload
        .as_array()
        .and_then(|items| items.first())
        .and_then(|first| first.get("summary_text"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(SummaryError::UnexpectedOutput)
}
