//! Live fan-out of event messages to connected viewers
//!
//! Every subscriber owns a bounded queue. Publishing never waits: when a
//! subscriber's queue is full the message is dropped for that subscriber only,
//! and the publisher moves on. Delivered messages keep publish order.
//!
//! Delivery order across concurrent publishers is whatever the callers
//! serialize; [`crate::event_log::EventLog`] publishes under its history lock.
//!
//! A new subscription can be seeded with a backlog (the event log history)
//! which is yielded before anything from the live queue.

use crate::types::EventMessage;
use futures::Stream;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Default capacity of each subscriber's live queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Opaque identifier of a registered subscriber
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

struct SubscriberEntry {
    tx: mpsc::Sender<EventMessage>,
    dropped: Arc<AtomicU64>,
}

/// Registry of live subscribers with per-subscriber bounded queues
pub struct Broadcaster {
    subscribers: Mutex<HashMap<SubscriberId, SubscriberEntry>>,
    next_id: AtomicU64,
    capacity: usize,
}

impl Broadcaster {
    /// Create a broadcaster whose subscribers each buffer up to `capacity` live messages
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            // mpsc::channel panics on zero capacity
            capacity: capacity.max(1),
        })
    }

    /// Capacity of each subscriber's live queue
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Deliver `message` to every registered subscriber without blocking
    ///
    /// Returns how many subscribers accepted the message. Subscribers whose
    /// queue is full miss this message; subscribers whose receiving side is
    /// gone are removed from the registry. The registry lock is only held to
    /// copy out the senders and to prune, never while sending.
    pub fn publish(&self, message: &EventMessage) -> usize {
        let targets: Vec<_> = self
            .subscribers
            .lock()
            .iter()
            .map(|(id, entry)| (*id, entry.tx.clone(), entry.dropped.clone()))
            .collect();

        let mut delivered = 0;
        let mut closed = Vec::new();

        for (id, tx, dropped) in targets {
            match tx.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    let dropped = dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    tracing::debug!(
                        subscriber = %id,
                        dropped,
                        "subscriber queue full, dropping message"
                    );
                }
                Err(TrySendError::Closed(_)) => closed.push(id),
            }
        }

        if !closed.is_empty() {
            let mut subscribers = self.subscribers.lock();
            for id in closed {
                subscribers.remove(&id);
                tracing::debug!(subscriber = %id, "pruned closed subscriber");
            }
        }

        delivered
    }

    /// Register a subscriber with no backlog
    pub fn subscribe(self: &Arc<Self>) -> Subscription {
        self.subscribe_with_backlog(Vec::new())
    }

    /// Register a subscriber that first yields `backlog`, then live messages
    ///
    /// Callers that need "no gap, no duplicate" between the backlog and the
    /// live stream must hold whatever lock serializes their publishes while
    /// taking the backlog and calling this.
    pub fn subscribe_with_backlog(self: &Arc<Self>, backlog: Vec<EventMessage>) -> Subscription {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.capacity);

        let count = {
            let mut subscribers = self.subscribers.lock();
            subscribers.insert(
                id,
                SubscriberEntry {
                    tx,
                    dropped: Arc::new(AtomicU64::new(0)),
                },
            );
            subscribers.len()
        };

        tracing::debug!(
            subscriber = %id,
            backlog = backlog.len(),
            subscribers = count,
            "subscriber registered"
        );

        Subscription {
            id,
            backlog: backlog.into(),
            rx,
            hub: Arc::downgrade(self),
        }
    }

    /// Remove a subscriber; returns false if it was not registered
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.subscribers.lock().remove(&id);
        if let Some(entry) = &removed {
            tracing::debug!(
                subscriber = %id,
                dropped = entry.dropped.load(Ordering::Relaxed),
                "subscriber removed"
            );
        }
        removed.is_some()
    }

    /// Number of currently registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Messages dropped so far for a subscriber because its queue was full
    pub fn dropped_for(&self, id: SubscriberId) -> Option<u64> {
        self.subscribers
            .lock()
            .get(&id)
            .map(|entry| entry.dropped.load(Ordering::Relaxed))
    }
}

/// Receiving side of one subscriber
///
/// Dropping the subscription unregisters it, after which no further delivery
/// is attempted.
pub struct Subscription {
    id: SubscriberId,
    backlog: VecDeque<EventMessage>,
    rx: mpsc::Receiver<EventMessage>,
    hub: Weak<Broadcaster>,
}

impl Subscription {
    /// Registry identifier of this subscriber
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Wait for the next message: backlog first, then the live queue
    ///
    /// Returns `None` once the broadcaster is gone and the queue is drained.
    pub async fn recv(&mut self) -> Option<EventMessage> {
        if let Some(message) = self.backlog.pop_front() {
            return Some(message);
        }
        self.rx.recv().await
    }

    /// Take the next message if one is immediately available
    pub fn try_recv(&mut self) -> Option<EventMessage> {
        self.backlog
            .pop_front()
            .or_else(|| self.rx.try_recv().ok())
    }

    /// Unregister explicitly; equivalent to dropping the subscription
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Turn the subscription into a stream; dropping the stream unsubscribes
    pub fn into_stream(self) -> impl Stream<Item = EventMessage> + Send + 'static {
        futures::stream::unfold(self, |mut subscription| async move {
            subscription
                .recv()
                .await
                .map(|message| (message, subscription))
        })
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.rx.close();
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(self.id);
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn texts(messages: &[EventMessage]) -> Vec<&str> {
        messages.iter().map(|m| m.text()).collect()
    }

    #[tokio::test]
    async fn publish_reaches_every_subscriber_in_order() {
        let hub = Broadcaster::new(10);
        let mut a = hub.subscribe();
        let mut b = hub.subscribe();

        for i in 0..3 {
            assert_eq!(hub.publish(&EventMessage::log(format!("m{i}"))), 2);
        }

        for sub in [&mut a, &mut b] {
            let mut got = Vec::new();
            for _ in 0..3 {
                got.push(sub.recv().await.unwrap());
            }
            assert_eq!(texts(&got), vec!["m0", "m1", "m2"]);
        }
    }

    #[tokio::test]
    async fn full_queue_drops_newest_without_blocking() {
        let hub = Broadcaster::new(2);
        let mut slow = hub.subscribe();

        for i in 0..5 {
            hub.publish(&EventMessage::log(format!("m{i}")));
        }

        assert_eq!(hub.dropped_for(slow.id()), Some(3));
        assert_eq!(slow.try_recv().unwrap().text(), "m0");
        assert_eq!(slow.try_recv().unwrap().text(), "m1");
        assert!(slow.try_recv().is_none());

        // Space freed: later messages are delivered again, still in order
        hub.publish(&EventMessage::log("m5"));
        assert_eq!(slow.recv().await.unwrap().text(), "m5");
    }

    #[tokio::test]
    async fn slow_subscriber_does_not_affect_fast_one() {
        let hub = Broadcaster::new(1);
        let _slow = hub.subscribe();
        let mut fast = hub.subscribe();

        for i in 0..3 {
            hub.publish(&EventMessage::log(format!("m{i}")));
            assert_eq!(fast.recv().await.unwrap().text(), format!("m{i}"));
        }
    }

    #[tokio::test]
    async fn backlog_precedes_live_messages() {
        let hub = Broadcaster::new(10);
        let backlog = vec![EventMessage::log("h0"), EventMessage::log("h1")];
        let mut sub = hub.subscribe_with_backlog(backlog);

        hub.publish(&EventMessage::progress(0, 1));

        assert_eq!(sub.recv().await.unwrap().text(), "h0");
        assert_eq!(sub.recv().await.unwrap().text(), "h1");
        assert_eq!(sub.recv().await.unwrap().text(), "0/1");
    }

    #[test]
    fn backlog_is_not_limited_by_queue_capacity() {
        let hub = Broadcaster::new(1);
        let backlog: Vec<_> = (0..50).map(|i| EventMessage::log(format!("h{i}"))).collect();
        let mut sub = hub.subscribe_with_backlog(backlog);

        let mut count = 0;
        while sub.try_recv().is_some() {
            count += 1;
        }
        assert_eq!(count, 50);
    }

    #[test]
    fn dropping_subscription_unregisters() {
        let hub = Broadcaster::new(10);
        let a = hub.subscribe();
        let b = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);

        drop(a);
        assert_eq!(hub.subscriber_count(), 1);

        b.unsubscribe();
        assert_eq!(hub.subscriber_count(), 0);
        assert_eq!(hub.publish(&EventMessage::log("nobody")), 0);
    }

    #[test]
    fn unsubscribe_by_id_stops_delivery() {
        let hub = Broadcaster::new(10);
        let mut sub = hub.subscribe();

        assert!(hub.unsubscribe(sub.id()));
        assert!(!hub.unsubscribe(sub.id()));

        hub.publish(&EventMessage::log("late"));
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn dropping_stream_unsubscribes() {
        let hub = Broadcaster::new(10);
        let mut stream = Box::pin(
            hub.subscribe_with_backlog(vec![EventMessage::log("h")])
                .into_stream(),
        );

        assert_eq!(stream.next().await.unwrap().text(), "h");
        assert_eq!(hub.subscriber_count(), 1);

        drop(stream);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn registry_changes_interleave_with_publishing() {
        let hub = Broadcaster::new(2);
        let mut keeper = hub.subscribe();

        let publisher = {
            let hub = hub.clone();
            tokio::spawn(async move {
                for i in 0..2000 {
                    hub.publish(&EventMessage::log(format!("m{i}")));
                    if i % 100 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        };
        let churn = {
            let hub = hub.clone();
            tokio::spawn(async move {
                for _ in 0..500 {
                    let sub = hub.subscribe();
                    tokio::task::yield_now().await;
                    drop(sub);
                }
            })
        };

        publisher.await.unwrap();
        churn.await.unwrap();

        assert_eq!(hub.subscriber_count(), 1);
        // The first two messages fit the queue, the rest were counted as dropped
        assert_eq!(keeper.try_recv().unwrap().text(), "m0");
        assert_eq!(keeper.try_recv().unwrap().text(), "m1");
        assert_eq!(hub.dropped_for(keeper.id()), Some(1998));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let hub = Broadcaster::new(0);
        assert_eq!(hub.capacity(), 1);
    }
}
