//! Application controller.
//!
//! [`App`] owns everything the user sees: the current [`ResultSet`], one
//! summary panel per article url, the in-flight fetch and a queue of
//! notices. It lives on the UI-owning task; background work reports back
//! through [`AppEvent`]s applied by [`App::handle_event`].

use crate::browser::{UrlOpener, validate_url};
use crate::error::SummaryError;
use crate::events::{AppEvent, EventSender, FetchEvent, FetchId, Ticket};
use crate::fetch::{FetchCoordinator, FetchHandle};
use crate::models::{Article, ResultSet};
use crate::news::NewsQuery;
use crate::summarize::{Summarizer, generate_summary, strip_truncation_marker};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// How long shutdown waits for an in-flight fetch before aborting it.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// What the article area currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// Startup screen, also shown after a failed fetch.
    Welcome,
    /// A fetch is running; `label` names what is being fetched.
    Loading { label: String },
    /// The current [`ResultSet`] as numbered cards.
    Articles,
}

/// Content of one article's summary panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelState {
    /// A summary task is running.
    Loading,
    /// Cleaned summary text.
    Ready(String),
    /// Shown inline in place of the summary.
    Failed(SummaryError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Panel {
    /// Only a result carrying this ticket may fill the panel.
    ticket: Ticket,
    state: PanelState,
}

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message for the user, the terminal equivalent of a dialog box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    /// Short heading, e.g. `"Busy"`.
    pub title: &'static str,
    pub message: String,
}

/// Result of a summarize click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// A panel was created and a summary task started.
    Opened,
    /// An open panel was removed.
    Closed,
    /// Nothing changed; a notice explains why.
    Rejected,
}

/// Controller state for one terminal session.
///
/// Panels are keyed by article url and never outlive the [`ResultSet`] they
/// were opened on. At most one fetch is in flight.
pub struct App {
    fetcher: FetchCoordinator,
    summarizer: Option<Arc<dyn Summarizer>>,
    opener: Arc<dyn UrlOpener>,
    events: EventSender,
    results: Option<ResultSet>,
    panels: HashMap<String, Panel>,
    view: View,
    in_flight: Option<FetchHandle>,
    next_fetch_id: FetchId,
    next_ticket: Ticket,
    notices: VecDeque<Notice>,
}

impl App {
    /// Create a controller on the welcome view.
    ///
    /// # Arguments
    /// * `fetcher` - Runs background fetches
    /// * `summarizer` - `None` disables AI summaries
    /// * `opener` - Hands article urls to the system browser
    /// * `events` - Where background tasks report back
    pub fn new(
        fetcher: FetchCoordinator,
        summarizer: Option<Arc<dyn Summarizer>>,
        opener: Arc<dyn UrlOpener>,
        events: EventSender,
    ) -> Self {
        Self {
            fetcher,
            summarizer,
            opener,
            events,
            results: None,
            panels: HashMap::new(),
            view: View::Welcome,
            in_flight: None,
            next_fetch_id: 1,
            next_ticket: 1,
            notices: VecDeque::new(),
        }
    }

    /// Current article-area view.
    pub fn view(&self) -> &View {
        &self.view
    }

    /// Result set of the last successful fetch, if it is still current.
    pub fn results(&self) -> Option<&ResultSet> {
        self.results.as_ref()
    }

    /// Summary panel for the article at `url`, if one is open.
    pub fn panel(&self, url: &str) -> Option<&PanelState> {
        self.panels.get(url).map(|p| &p.state)
    }

    /// Number of open summary panels.
    pub fn open_panels(&self) -> usize {
        self.panels.len()
    }

    /// Whether a fetch has started but not yet sent `Finished`.
    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether a summarizer is configured.
    pub fn ai_enabled(&self) -> bool {
        self.summarizer.is_some()
    }

    /// Article by its 1-based card number.
    pub fn article(&self, number: usize) -> Option<&Article> {
        number
            .checked_sub(1)
            .and_then(|i| self.results.as_ref()?.get(i))
    }

    /// Url of card `number` for a summary or read command.
    ///
    /// While a fetch is loading the old cards are no longer on screen, so
    /// the command is refused with a notice, as is an out-of-range number.
    pub fn card_url(&mut self, number: usize) -> Option<String> {
        if self.is_fetching() {
            self.notify(
                NoticeLevel::Warning,
                "Busy",
                "Articles are still loading. Please wait.",
            );
            return None;
        }
        match self.article(number) {
            Some(article) => Some(article.url.clone()),
            None => {
                self.notify(
                    NoticeLevel::Warning,
                    "No Such Article",
                    format!("No article {number} in the current list."),
                );
                None
            }
        }
    }

    /// Drain queued notices, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    fn notify(&mut self, level: NoticeLevel, title: &'static str, message: impl Into<String>) {
        self.notices.push_back(Notice {
            level,
            title,
            message: message.into(),
        });
    }

    /// Search box submit.
    pub fn submit_search(&mut self, input: &str) -> bool {
        let query = input.trim();
        if query.is_empty() {
            self.notify(NoticeLevel::Info, "Input Required", "Please enter a search term.");
            return false;
        }
        self.fetch(NewsQuery::Search(query.to_string()))
    }

    /// Start a background fetch unless one is already running.
    #[instrument(level = "info", skip(self))]
    pub fn fetch(&mut self, query: NewsQuery) -> bool {
        if self.in_flight.is_some() {
            self.notify(NoticeLevel::Warning, "Busy", "Already fetching news. Please wait.");
            return false;
        }

        let id = self.next_fetch_id;
        self.next_fetch_id += 1;
        self.view = View::Loading {
            label: query.label(),
        };
        self.in_flight = Some(self.fetcher.spawn(id, query, self.events.clone()));
        info!(fetch_id = id, "Fetch started");
        true
    }

    /// Apply one event from a background task.
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Fetch { id, event } => self.on_fetch_event(id, event),
            AppEvent::SummaryDone { url, ticket, result } => self.on_summary(url, ticket, result),
        }
    }

    fn on_fetch_event(&mut self, id: FetchId, event: FetchEvent) {
        if self.in_flight.as_ref().map(FetchHandle::id) != Some(id) {
            debug!(fetch_id = id, "Ignoring event from a superseded fetch");
            return;
        }
        match event {
            FetchEvent::Fetched(set) => {
                info!(
                    fetch_id = id,
                    count = set.len(),
                    cleared_panels = self.open_panels(),
                    "Installing new result set"
                );
                self.results = Some(set);
                self.panels.clear();
                self.view = View::Articles;
            }
            FetchEvent::Failed(e) => {
                self.results = None;
                self.panels.clear();
                self.view = View::Welcome;
                self.notify(NoticeLevel::Error, "Error Fetching News", e.to_string());
            }
            FetchEvent::Finished => {
                debug!(fetch_id = id, "Fetch finished");
                self.in_flight = None;
            }
        }
    }

    fn on_summary(&mut self, url: String, ticket: Ticket, result: Result<String, SummaryError>) {
        match self.panels.get_mut(&url) {
            Some(panel) if panel.ticket == ticket => {
                panel.state = match result {
                    Ok(text) => PanelState::Ready(text),
                    Err(e) => PanelState::Failed(e),
                };
            }
            Some(_) => debug!(%url, ticket, "Summary belongs to an older panel; dropping"),
            None => debug!(%url, ticket, "Summary finished, but the panel was already closed"),
        }
    }

    /// "AI Summary" click: close an open panel, otherwise start a summary.
    #[instrument(level = "info", skip(self))]
    pub fn toggle_summary(&mut self, url: &str) -> Toggle {
        let Some(summarizer) = self.summarizer.clone() else {
            self.notify(
                NoticeLevel::Warning,
                "AI Features Disabled",
                "Local AI summarization needs a summarization server. Start one and pass --summarizer-url, then restart.",
            );
            return Toggle::Rejected;
        };

        if self.panels.remove(url).is_some() {
            info!("Hiding summary");
            return Toggle::Closed;
        }

        let Some(article) = self.results.as_ref().and_then(|r| r.find(url)) else {
            self.notify(NoticeLevel::Warning, "Error", "Could not find article data for summary.");
            return Toggle::Rejected;
        };

        let text = article.body().map(strip_truncation_marker).unwrap_or_default().to_string();
        if text.is_empty() {
            self.notify(
                NoticeLevel::Info,
                "Cannot Summarize",
                "Article has no content or description available for summarization.",
            );
            return Toggle::Rejected;
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.panels.insert(
            url.to_string(),
            Panel {
                ticket,
                state: PanelState::Loading,
            },
        );

        let events = self.events.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            let result = generate_summary(summarizer.as_ref(), &text).await;
            if let Err(e) = events.send(AppEvent::SummaryDone { url, ticket, result }).await {
                debug!(error = %e, "Event receiver gone; dropping summary");
            }
        });
        Toggle::Opened
    }

    /// "Read Article" click.
    pub fn open_article(&mut self, url: &str) -> bool {
        let opened = validate_url(url).and_then(|u| self.opener.open(&u));
        match opened {
            Ok(()) => true,
            Err(e) => {
                warn!(%url, error = %e, "Could not open article");
                self.notify(
                    NoticeLevel::Warning,
                    "Error Opening URL",
                    format!("Could not open the article URL.\nError: {e}"),
                );
                false
            }
        }
    }

    /// Stop any in-flight fetch. Summaries in progress are left to finish
    /// on their own; their results go nowhere.
    pub async fn shutdown(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            info!(fetch_id = handle.id(), state = ?handle.state(), "Stopping in-flight fetch");
            handle.shutdown(SHUTDOWN_GRACE).await;
        }
    }
}
