//! In-memory fakes for the collaborator traits, shared by unit tests.

use crate::error::{FetchError, SummaryError};
use crate::models::{NewsResponse, RawArticle, RawSource};
use crate::news::{NewsQuery, NewsSource};
use crate::summarize::{SummaryParams, Summarizer};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

pub const TEST_KEY: &str = "0123456789abcdef0123456789abcdef";

pub fn raw_article(title: Option<&str>, url: &str, content: Option<&str>) -> RawArticle {
    RawArticle {
        source: Some(RawSource {
            name: Some("Test Wire".to_string()),
        }),
        title: title.map(str::to_string),
        description: Some(format!("Description of {url}")),
        url: Some(url.to_string()),
        content: content.map(str::to_string),
        published_at: Some("2025-05-06T14:30:00Z".to_string()),
    }
}

pub fn ok_response(articles: Vec<RawArticle>) -> NewsResponse {
    NewsResponse {
        status: "ok".to_string(),
        code: None,
        message: None,
        total_results: Some(articles.len() as u64),
        articles,
    }
}

enum Behavior {
    Respond(Vec<Result<NewsResponse, FetchError>>),
    Hang,
}

/// Scripted [`NewsSource`]: hands out queued responses in order.
pub struct FakeSource {
    behavior: Mutex<Behavior>,
    calls: AtomicUsize,
    last_query: Mutex<Option<NewsQuery>>,
}

impl std::fmt::Debug for FakeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeSource").field("calls", &self.calls()).finish()
    }
}

impl FakeSource {
    pub fn new(responses: Vec<Result<NewsResponse, FetchError>>) -> Self {
        Self {
            behavior: Mutex::new(Behavior::Respond(responses)),
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    /// A source whose request never completes.
    pub fn hanging() -> Self {
        Self {
            behavior: Mutex::new(Behavior::Hang),
            calls: AtomicUsize::new(0),
            last_query: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_query(&self) -> Option<NewsQuery> {
        self.last_query.lock().unwrap().clone()
    }
}

#[async_trait]
impl NewsSource for FakeSource {
    async fn fetch(&self, _api_key: &str, query: &NewsQuery) -> Result<NewsResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.clone());
        let next = match &mut *self.behavior.lock().unwrap() {
            Behavior::Respond(queue) if !queue.is_empty() => Some(queue.remove(0)),
            Behavior::Respond(_) => Some(Err(FetchError::Network("script exhausted".to_string()))),
            Behavior::Hang => None,
        };
        match next {
            Some(result) => result,
            None => std::future::pending().await,
        }
    }

    fn describe(&self, query: &NewsQuery) -> String {
        query.describe("us")
    }
}

/// [`Summarizer`] that echoes a fixed reply and records its inputs.
pub struct FakeSummarizer {
    reply: Result<String, SummaryError>,
    inputs: Mutex<Vec<String>>,
}

impl std::fmt::Debug for FakeSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeSummarizer").finish()
    }
}

impl FakeSummarizer {
    pub fn new(reply: Result<String, SummaryError>) -> Self {
        Self {
            reply,
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(&self, text: &str, _params: &SummaryParams) -> Result<String, SummaryError> {
        self.inputs.lock().unwrap().push(text.to_string());
        self.reply.clone()
    }
}

/// Serve one canned HTTP response on an ephemeral 127.0.0.1 port.
///
/// The whole request (headers plus `Content-Length` body) is read before
/// replying. Returns the base url of the listener, with a trailing slash.
pub async fn serve_once(status: &str, content_type: &str, body: &str) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
            if request_complete(&request) {
                break;
            }
        }
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    Url::parse(&format!("http://{addr}/")).unwrap()
}

fn request_complete(request: &[u8]) -> bool {
    let text = String::from_utf8_lossy(request);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let content_length = text[..header_end]
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    request.len() >= header_end + 4 + content_length
}
