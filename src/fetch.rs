//! Background news fetching.
//!
//! A [`FetchCoordinator`] performs one outbound request per invocation on a
//! spawned tokio task and reports back over the event channel:
//!
//! ```text
//! Idle -> Requesting -> DeliveringSuccess -> Finished
//!                    \-> DeliveringError  -/
//! ```
//!
//! Exactly one [`FetchEvent::Fetched`] or [`FetchEvent::Failed`] is sent per
//! run, always followed by [`FetchEvent::Finished`]. Nothing is retried; a
//! retry is a new run with a new id.

use crate::config::validate_api_key;
use crate::error::FetchError;
use crate::events::{AppEvent, EventSender, FetchEvent, FetchId};
use crate::models::ResultSet;
use crate::news::{NewsQuery, NewsSource};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Lifecycle of one fetch task, published through a `watch` channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    /// Spawned, nothing sent yet.
    Idle,
    /// Waiting on the news source.
    Requesting,
    /// Sending [`FetchEvent::Fetched`].
    DeliveringSuccess,
    /// Sending [`FetchEvent::Failed`].
    DeliveringError,
    /// [`FetchEvent::Finished`] is being or has been sent.
    Finished,
}

/// Runs NewsAPI requests against a [`NewsSource`].
#[derive(Clone)]
pub struct FetchCoordinator {
    source: Arc<dyn NewsSource>,
    api_key: String,
}

impl std::fmt::Debug for FetchCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchCoordinator")
            .field("source", &self.source)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl FetchCoordinator {
    /// Create a coordinator.
    ///
    /// # Arguments
    /// * `source` - The news backend to query
    /// * `api_key` - Credential passed to every request; checked again per run
    pub fn new(source: Arc<dyn NewsSource>, api_key: impl Into<String>) -> Self {
        Self {
            source,
            api_key: api_key.into(),
        }
    }

    /// Perform one request and validate the response.
    ///
    /// An invalid credential fails before the source is touched. Zero
    /// articles and zero *valid* articles are both errors.
    #[instrument(level = "info", skip_all, fields(query = ?query))]
    pub async fn run(&self, query: &NewsQuery) -> Result<ResultSet, FetchError> {
        let api_key = validate_api_key(Some(self.api_key.as_str()))?;
        let request = self.source.describe(query);
        info!(%request, "Fetching news");

        let response = self.source.fetch(api_key, query).await?;

        if response.status != "ok" {
            return Err(FetchError::Api {
                code: response.code.unwrap_or_else(|| "unknown".to_string()),
                message: response.message.unwrap_or_else(|| "Unknown error".to_string()),
            });
        }

        let received = response.articles.len();
        if received == 0 {
            return Err(FetchError::NoArticles { request });
        }

        match ResultSet::from_raw(response.articles) {
            Some(set) => {
                info!(received, valid = set.len(), "Validated articles");
                Ok(set)
            }
            None => {
                warn!(received, "Articles received, but none passed validation");
                Err(FetchError::NoValidArticles { request })
            }
        }
    }

    /// Start a run on a background task.
    ///
    /// Outcomes are sent to `events` tagged with `id`. The returned handle
    /// can stop the run at shutdown.
    pub fn spawn(&self, id: FetchId, query: NewsQuery, events: EventSender) -> FetchHandle {
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let (state_tx, state_rx) = watch::channel(FetchState::Idle);
        let coordinator = self.clone();

        let join = tokio::spawn(async move {
            state_tx.send_replace(FetchState::Requesting);
            let outcome = tokio::select! {
                biased;
                Ok(()) = stop_rx => None,
                res = coordinator.run(&query) => Some(res),
            };

            match outcome {
                Some(Ok(set)) => {
                    state_tx.send_replace(FetchState::DeliveringSuccess);
                    deliver(&events, id, FetchEvent::Fetched(set)).await;
                }
                Some(Err(e)) => {
                    warn!(fetch_id = id, error = %e, "Fetch failed");
                    state_tx.send_replace(FetchState::DeliveringError);
                    deliver(&events, id, FetchEvent::Failed(e)).await;
                }
                None => {
                    info!(fetch_id = id, "Fetch stopped before completion");
                }
            }

            state_tx.send_replace(FetchState::Finished);
            deliver(&events, id, FetchEvent::Finished).await;
        });

        FetchHandle {
            id,
            stop: Some(stop_tx),
            join,
            state: state_rx,
        }
    }
}

async fn deliver(events: &EventSender, id: FetchId, event: FetchEvent) {
    if let Err(e) = events.send(AppEvent::Fetch { id, event }).await {
        debug!(fetch_id = id, error = %e, "Event receiver gone; dropping fetch event");
    }
}

/// Owner's side of a running fetch.
#[derive(Debug)]
pub struct FetchHandle {
    id: FetchId,
    stop: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
    state: watch::Receiver<FetchState>,
}

impl FetchHandle {
    /// Id the task tags its events with.
    pub fn id(&self) -> FetchId {
        self.id
    }

    /// Latest state published by the task.
    pub fn state(&self) -> FetchState {
        *self.state.borrow()
    }

    /// Ask the task to stop and wait up to `grace` for it, then abort.
    ///
    /// Returns `true` if the task ended on its own.
    #[instrument(level = "info", skip(self), fields(fetch_id = self.id))]
    pub async fn shutdown(mut self, grace: Duration) -> bool {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        match tokio::time::timeout(grace, &mut self.join).await {
            Ok(_) => {
                info!("Fetch task finished");
                true
            }
            Err(_) => {
                warn!(?grace, "Fetch task did not stop in time; aborting");
                self.join.abort();
                let _ = (&mut self.join).await;
                false
            }
        }
    }
}
