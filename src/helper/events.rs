use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::Instant;

use vizion_widget_api::SearchResults;

use crate::client::SearchError;

/// Sequence number of a dispatched search.
pub type Generation = u64;

/// Identifies a derived pipeline created by [`SearchHelper::derive`](super::SearchHelper::derive).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DerivedId(pub(crate) u64);

impl DerivedId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

/// The pipeline an event belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pipeline {
    Main,
    Derived(DerivedId),
}

/// Notifications emitted by a search helper.
#[derive(Clone, Debug, PartialEq)]
pub enum HelperEvent {
    /// A request was dispatched at `at`.
    Search { at: Instant },
    /// A pipeline received its response.
    Result {
        pipeline: Pipeline,
        generation: Generation,
        results: SearchResults,
    },
    /// A pipeline's request failed.
    Error {
        pipeline: Pipeline,
        generation: Generation,
        error: SearchError,
    },
}

/// Sending half handed to the helper.
#[derive(Clone, Debug)]
pub struct EventSink {
    tx: Sender<HelperEvent>,
}

impl EventSink {
    /// Queue an event. Returns `false` once the receiving coordinator is gone.
    pub fn emit(&self, event: HelperEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Receiving half owned by the coordinator.
#[derive(Debug)]
pub struct EventReceiver {
    rx: Receiver<HelperEvent>,
    buffered: VecDeque<HelperEvent>,
}

impl EventReceiver {
    /// Next queued event, without blocking.
    pub fn try_next(&mut self) -> Option<HelperEvent> {
        if let Some(event) = self.buffered.pop_front() {
            return Some(event);
        }
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Returns `true` when an event is waiting.
    pub fn has_pending(&mut self) -> bool {
        if !self.buffered.is_empty() {
            return true;
        }
        match self.rx.try_recv() {
            Ok(event) => {
                self.buffered.push_back(event);
                true
            }
            Err(_) => false,
        }
    }
}

/// Create a connected sink/receiver pair.
#[must_use]
pub fn event_channel() -> (EventSink, EventReceiver) {
    let (tx, rx) = mpsc::channel();
    (
        EventSink { tx },
        EventReceiver {
            rx,
            buffered: VecDeque::new(),
        },
    )
}
