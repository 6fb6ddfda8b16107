//! Hand article urls to the platform's default browser.

use std::fmt;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{info, instrument};
use url::Url;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpenError {
    #[error("Invalid or missing URL: {0}")]
    InvalidUrl(String),

    #[error("Could not launch the browser: {0}")]
    Launch(String),
}

/// Only absolute http(s) urls are handed to the opener.
pub fn validate_url(raw: &str) -> Result<Url, OpenError> {
    let url = Url::parse(raw.trim()).map_err(|e| OpenError::InvalidUrl(format!("{raw} ({e})")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(OpenError::InvalidUrl(raw.to_string())),
    }
}

pub trait UrlOpener: Send + Sync + fmt::Debug {
    fn open(&self, url: &Url) -> Result<(), OpenError>;
}

/// Spawns `xdg-open`, `open` or `cmd /C start` depending on the platform.
#[derive(Debug, Default)]
pub struct SystemOpener;

impl UrlOpener for SystemOpener {
    #[instrument(level = "info", skip_all, fields(url = %url))]
    fn open(&self, url: &Url) -> Result<(), OpenError> {
        let mut cmd = if cfg!(target_os = "macos") {
            Command::new("open")
        } else if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", "start", ""]);
            c
        } else {
            Command::new("xdg-open")
        };
        cmd.arg(url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| OpenError::Launch(e.to_string()))?;
        info!("Opened article in browser");
        Ok(())
    }
}
