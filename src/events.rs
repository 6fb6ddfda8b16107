//! Messages handed from background tasks to the UI-owning task.
//!
//! Background work never touches controller state directly; it sends one of
//! these over a bounded channel and the shell loop applies it with
//! [`crate::app::App::handle_event`].

use crate::error::{FetchError, SummaryError};
use crate::models::ResultSet;
use tokio::sync::mpsc;

/// Capacity of the background → UI channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Identifies one fetch invocation.
pub type FetchId = u64;

/// Identifies one summarization request for a panel.
pub type Ticket = u64;

/// Outcome notifications from one fetch. A run emits exactly one of
/// `Fetched`/`Failed`, then `Finished`.
#[derive(Debug)]
pub enum FetchEvent {
    Fetched(ResultSet),
    Failed(FetchError),
    Finished,
}

#[derive(Debug)]
pub enum AppEvent {
    Fetch {
        id: FetchId,
        event: FetchEvent,
    },
    SummaryDone {
        url: String,
        ticket: Ticket,
        result: Result<String, SummaryError>,
    },
}

pub type EventSender = mpsc::Sender<AppEvent>;
pub type EventReceiver = mpsc::Receiver<AppEvent>;

pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::channel(EVENT_CHANNEL_CAPACITY)
}
