//! Fan-out bus
//!
//! Topic-keyed pub/sub over `tokio::sync::broadcast`. Messages are empty
//! advisory signals ("something changed, reload"); every consumer reacts by
//! re-fetching its own authoritative, permission-scoped view, which keeps
//! consumers idempotent under replay and tolerant of missed messages.
//!
//! Delivery is at-least-once with no ordering guarantee. Receivers collapse
//! bursts with a short debounce window so a rush of near-simultaneous
//! check-ins triggers one reload, not fifty.

use dashmap::DashMap;
use shared::message::Topic;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Per-topic channel capacity. Signals are advisory, so a lagged receiver
/// losing intermediate signals is harmless; the next reload covers them.
const TOPIC_CHANNEL_CAPACITY: usize = 64;

/// Default receiver-side debounce window
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

/// Topic-keyed advisory pub/sub
#[derive(Clone, Debug, Default)]
pub struct FanoutBus {
    topics: Arc<DashMap<Topic, broadcast::Sender<()>>>,
}

impl FanoutBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a refresh signal to a topic. A topic nobody subscribes to is
    /// dropped on the floor; publish never fails.
    pub fn publish(&self, topic: &Topic) {
        if let Some(sender) = self.topics.get(topic) {
            if sender.send(()).is_err() {
                // Last receiver is gone; drop the topic so the map does not
                // accumulate dead channels
                drop(sender);
                self.topics
                    .remove_if(topic, |_, s| s.receiver_count() == 0);
            }
        }
    }

    /// Subscribe to a topic, creating it on first use
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<()> {
        self.topics
            .entry(topic)
            .or_insert_with(|| broadcast::channel(TOPIC_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Subscribe with the default debounce window applied
    pub fn listen(&self, topic: Topic) -> RefreshListener {
        RefreshListener {
            rx: self.subscribe(topic),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Number of live topics (diagnostics)
    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }
}

/// A debounced topic subscription
///
/// `next()` waits for a signal, then absorbs everything arriving within the
/// debounce window before yielding once. A lagged receiver yields as well;
/// the signal carries no payload, so only the fact that something changed
/// matters.
pub struct RefreshListener {
    rx: broadcast::Receiver<()>,
    debounce: Duration,
}

impl RefreshListener {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Wait for the next (coalesced) refresh signal. Returns `None` when the
    /// bus side is gone.
    pub async fn next(&mut self) -> Option<()> {
        use broadcast::error::{RecvError, TryRecvError};

        match self.rx.recv().await {
            Ok(()) | Err(RecvError::Lagged(_)) => {}
            Err(RecvError::Closed) => return None,
        }

        // Collapse the burst
        tokio::time::sleep(self.debounce).await;
        loop {
            match self.rx.try_recv() {
                Ok(()) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }

        Some(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_topic(id: &str) -> Topic {
        Topic::List(id.to_string())
    }

    #[tokio::test]
    async fn publish_reaches_subscriber() {
        let bus = FanoutBus::new();
        let mut listener = bus.listen(list_topic("l1")).with_debounce(Duration::ZERO);

        bus.publish(&list_topic("l1"));
        assert_eq!(listener.next().await, Some(()));
    }

    #[tokio::test]
    async fn topics_are_independent() {
        let bus = FanoutBus::new();
        let mut other = bus.listen(list_topic("l2")).with_debounce(Duration::ZERO);

        bus.publish(&list_topic("l1"));
        // Nothing on l2
        let raced = tokio::time::timeout(Duration::from_millis(20), other.next()).await;
        assert!(raced.is_err());
    }

    #[tokio::test]
    async fn burst_collapses_to_one_signal() {
        let bus = FanoutBus::new();
        let mut listener = bus
            .listen(list_topic("l1"))
            .with_debounce(Duration::from_millis(30));

        for _ in 0..20 {
            bus.publish(&list_topic("l1"));
        }
        assert_eq!(listener.next().await, Some(()));

        // The burst was absorbed; no residual signal
        let raced = tokio::time::timeout(Duration::from_millis(50), listener.next()).await;
        assert!(raced.is_err());
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_a_noop() {
        let bus = FanoutBus::new();
        bus.publish(&list_topic("nobody"));
        assert_eq!(bus.topic_count(), 0);
    }

    #[tokio::test]
    async fn lagged_receiver_still_wakes() {
        let bus = FanoutBus::new();
        let mut listener = bus.listen(list_topic("l1")).with_debounce(Duration::ZERO);

        for _ in 0..(TOPIC_CHANNEL_CAPACITY * 2) {
            bus.publish(&list_topic("l1"));
        }
        assert_eq!(listener.next().await, Some(()));
    }
}
