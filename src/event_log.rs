//! Bounded in-memory history of log messages
//!
//! The event log is the single entry point for everything a task run reports.
//! Log-kind messages are kept (oldest evicted first once the limit is hit);
//! every message is forwarded to the [`Broadcaster`]. Recording and
//! subscribing share one lock, so a new subscriber's replayed history and its
//! live queue neither overlap nor leave a gap.

use crate::broadcast::{Broadcaster, Subscription};
use crate::driver::EventSink;
use crate::types::{EventKind, EventMessage};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Default number of log entries kept in history
pub const DEFAULT_HISTORY_LIMIT: usize = 1000;

/// Bounded log history that also feeds the live broadcaster
pub struct EventLog {
    history: Mutex<VecDeque<EventMessage>>,
    limit: usize,
    hub: Arc<Broadcaster>,
}

impl EventLog {
    /// Create an empty log keeping at most `limit` entries
    pub fn new(limit: usize, hub: Arc<Broadcaster>) -> Self {
        Self {
            history: Mutex::new(VecDeque::with_capacity(limit.min(DEFAULT_HISTORY_LIMIT))),
            limit,
            hub,
        }
    }

    /// Append a log line and forward it to live subscribers
    pub fn append(&self, text: impl Into<String>) {
        self.record(EventMessage::log(text));
    }

    /// Record any message
    ///
    /// Log-kind messages are added to history; progress and status messages
    /// are only forwarded. Both happen under the history lock so all
    /// subscribers observe one global order.
    pub fn record(&self, message: EventMessage) {
        let mut history = self.history.lock();

        if message.kind() == EventKind::Log {
            history.push_back(message.clone());
            while history.len() > self.limit {
                history.pop_front();
            }
        }

        self.hub.publish(&message);
    }

    /// Copy of the current history, oldest first
    pub fn snapshot(&self) -> Vec<EventMessage> {
        self.history.lock().iter().cloned().collect()
    }

    /// Subscribe to live messages, seeded with the current history
    pub fn subscribe(&self) -> Subscription {
        let history = self.history.lock();
        let backlog = history.iter().cloned().collect();
        self.hub.subscribe_with_backlog(backlog)
    }

    /// Number of entries currently kept
    pub fn len(&self) -> usize {
        self.history.lock().len()
    }

    /// Whether the history is empty
    pub fn is_empty(&self) -> bool {
        self.history.lock().is_empty()
    }

    /// Maximum number of entries kept
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// The broadcaster this log forwards to
    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.hub
    }
}

impl EventSink for EventLog {
    fn emit(&self, message: EventMessage) {
        self.record(message);
    }
}
