//! Topic-addressed in-process event bus.
//!
//! [`EventBus`] owns the registry mapping each topic to its active
//! subscriber inboxes and fans every published [`EventPayload`] out to all
//! of them. It is designed to be constructed once and shared via
//! `Arc<EventBus>` across the application.
//!
//! Delivery policy: each inbox is a bounded queue and every send is
//! non-blocking. A full inbox drops the event for that one subscriber only;
//! the publisher is never delayed by a slow or stalled consumer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, RwLock};

use crate::catalog::EventPayload;

/// Default bounded capacity of each subscriber inbox.
pub const INBOX_CAPACITY: usize = 10;

// ---------------------------------------------------------------------------
// Delivery
// ---------------------------------------------------------------------------

/// Fan-out report for a single publish call.
///
/// Dropped deliveries are a diagnostic record, not an error: the bus favors
/// publisher latency over per-subscriber completeness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    /// Number of inboxes the payload was placed into.
    pub delivered: usize,
    /// Number of subscribers whose inbox was full or already closed.
    pub dropped: usize,
}

// ---------------------------------------------------------------------------
// Inbox
// ---------------------------------------------------------------------------

/// Receiving half of one subscription: a bounded queue of pending payloads.
///
/// Returned by [`EventBus::subscribe`] and handed back to
/// [`EventBus::unsubscribe`] to tear the subscription down. Receiving
/// returns `None` once the subscription has been removed from the registry
/// and the buffer is drained.
pub struct Inbox {
    id: u64,
    topic: String,
    receiver: mpsc::Receiver<EventPayload>,
}

impl Inbox {
    /// Wait for the next payload, or `None` at end-of-stream.
    pub async fn recv(&mut self) -> Option<EventPayload> {
        self.receiver.recv().await
    }

    /// The topic this inbox is subscribed to.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

/// Sending half of one subscription, kept in the registry.
struct Registered {
    id: u64,
    sender: mpsc::Sender<EventPayload>,
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// In-process topic-addressed fan-out bus.
///
/// Registry mutation (subscribe/unsubscribe) takes the write lock; fan-out
/// takes the read lock, so publishes to different topics proceed in
/// parallel and never wait on each other beyond the snapshot read.
///
/// # Usage
///
/// ```rust
/// use relay_core::topics::TOPIC_USER_DELETED;
/// use relay_core::user_events::UserDeletedPayload;
/// use relay_events::bus::EventBus;
///
/// # async fn demo() {
/// let bus = EventBus::default();
/// let mut inbox = bus.subscribe(TOPIC_USER_DELETED).await;
///
/// bus.publish(
///     TOPIC_USER_DELETED,
///     UserDeletedPayload { user_id: "7".into() }.into(),
/// )
/// .await;
/// # }
/// ```
pub struct EventBus {
    topics: RwLock<HashMap<String, Vec<Registered>>>,
    next_id: AtomicU64,
    inbox_capacity: usize,
}

impl EventBus {
    /// Create a bus whose inboxes hold `inbox_capacity` pending payloads.
    pub fn new(inbox_capacity: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(0),
            inbox_capacity: inbox_capacity.max(1),
        }
    }

    /// Register a new subscription under `topic` and return its inbox.
    ///
    /// Unknown topics are not an error; the catalog check belongs to the
    /// publisher, not the bus.
    pub async fn subscribe(&self, topic: &str) -> Inbox {
        let (sender, receiver) = mpsc::channel(self.inbox_capacity);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut topics = self.topics.write().await;
        let subs = topics.entry(topic.to_string()).or_default();
        subs.push(Registered { id, sender });
        tracing::info!(topic, subscribers = subs.len(), "Subscribed to topic");

        Inbox {
            id,
            topic: topic.to_string(),
            receiver,
        }
    }

    /// Publish a payload to every subscriber currently registered under
    /// `topic`.
    ///
    /// Each send is non-blocking: a full inbox drops the payload for that
    /// subscriber only, and the drop is logged. Zero subscribers is not an
    /// error; the payload is silently discarded.
    pub async fn publish(&self, topic: &str, payload: EventPayload) -> Delivery {
        let topics = self.topics.read().await;
        let Some(subs) = topics.get(topic) else {
            return Delivery::default();
        };

        let mut delivery = Delivery::default();
        for sub in subs {
            match sub.sender.try_send(payload.clone()) {
                Ok(()) => delivery.delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    delivery.dropped += 1;
                    tracing::warn!(
                        topic,
                        subscription_id = sub.id,
                        "Subscriber inbox full, dropping event for one listener"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Lost the race with an unsubscribe; the registry entry
                    // disappears on its own.
                    delivery.dropped += 1;
                    tracing::debug!(
                        topic,
                        subscription_id = sub.id,
                        "Subscriber inbox closed during fan-out"
                    );
                }
            }
        }
        delivery
    }

    /// Remove `inbox`'s subscription from `topic` and close it.
    ///
    /// Closing lets a blocked reader observe end-of-stream. Idempotent: if
    /// the subscription was already removed, this is a no-op.
    pub async fn unsubscribe(&self, topic: &str, inbox: &Inbox) {
        let mut topics = self.topics.write().await;
        let Some(subs) = topics.get_mut(topic) else {
            return;
        };

        let before = subs.len();
        subs.retain(|sub| sub.id != inbox.id);
        if subs.len() < before {
            tracing::info!(
                topic,
                subscribers = subs.len(),
                "Unsubscribed from topic"
            );
        }
        if subs.is_empty() {
            topics.remove(topic);
        }
    }

    /// Number of active subscriptions under `topic`.
    pub async fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .await
            .get(topic)
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(INBOX_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use relay_core::topics::{TOPIC_USER_CREATED, TOPIC_USER_UPDATED};
    use relay_core::user_events::{UserCreatedPayload, UserUpdatedPayload};

    use super::*;

    fn created(user_id: &str) -> EventPayload {
        UserCreatedPayload {
            user_id: user_id.into(),
            name: "Ann".into(),
            email: "a@x.com".into(),
        }
        .into()
    }

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = EventBus::default();
        let mut inbox = bus.subscribe(TOPIC_USER_CREATED).await;

        let delivery = bus.publish(TOPIC_USER_CREATED, created("1")).await;
        assert_eq!(delivery, Delivery { delivered: 1, dropped: 0 });

        let received = inbox.recv().await.expect("should receive the payload");
        assert_eq!(received, created("1"));
    }

    #[tokio::test]
    async fn fan_out_reaches_every_subscriber_in_publish_order() {
        let bus = EventBus::default();
        let mut first = bus.subscribe(TOPIC_USER_CREATED).await;
        let mut second = bus.subscribe(TOPIC_USER_CREATED).await;

        bus.publish(TOPIC_USER_CREATED, created("1")).await;
        bus.publish(TOPIC_USER_CREATED, created("2")).await;

        for inbox in [&mut first, &mut second] {
            assert_eq!(inbox.recv().await, Some(created("1")));
            assert_eq!(inbox.recv().await, Some(created("2")));
        }
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_is_silently_discarded() {
        let bus = EventBus::default();

        let delivery = bus.publish(TOPIC_USER_CREATED, created("1")).await;
        assert_eq!(delivery, Delivery::default());
    }

    #[tokio::test]
    async fn topics_are_isolated_from_each_other() {
        let bus = EventBus::default();
        let mut created_inbox = bus.subscribe(TOPIC_USER_CREATED).await;
        let mut updated_inbox = bus.subscribe(TOPIC_USER_UPDATED).await;

        bus.publish(TOPIC_USER_CREATED, created("1")).await;

        assert_eq!(created_inbox.recv().await, Some(created("1")));
        // Nothing was published to user.updated; its registry entry is
        // untouched.
        assert_eq!(bus.subscriber_count(TOPIC_USER_UPDATED).await, 1);
        bus.unsubscribe(TOPIC_USER_UPDATED, &updated_inbox).await;
        assert_eq!(updated_inbox.recv().await, None);
    }

    #[tokio::test]
    async fn full_inbox_drops_for_that_subscriber_only() {
        let bus = EventBus::default();
        let _stalled = bus.subscribe(TOPIC_USER_CREATED).await;
        let mut draining = bus.subscribe(TOPIC_USER_CREATED).await;

        for i in 0..INBOX_CAPACITY {
            let delivery = bus
                .publish(TOPIC_USER_CREATED, created(&i.to_string()))
                .await;
            assert_eq!(delivery, Delivery { delivered: 2, dropped: 0 });
            // Keep the second inbox empty so only the stalled one fills up.
            draining.recv().await.expect("draining inbox should receive");
        }

        let eleventh = bus.publish(TOPIC_USER_CREATED, created("10")).await;
        assert_eq!(eleventh, Delivery { delivered: 1, dropped: 1 });
        assert_eq!(draining.recv().await, Some(created("10")));
    }

    #[tokio::test]
    async fn unsubscribe_closes_the_inbox() {
        let bus = EventBus::default();
        let mut inbox = bus.subscribe(TOPIC_USER_CREATED).await;

        bus.unsubscribe(TOPIC_USER_CREATED, &inbox).await;

        assert_eq!(inbox.recv().await, None);
        assert_eq!(bus.subscriber_count(TOPIC_USER_CREATED).await, 0);
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent() {
        let bus = EventBus::default();
        let inbox = bus.subscribe(TOPIC_USER_CREATED).await;

        bus.unsubscribe(TOPIC_USER_CREATED, &inbox).await;
        // Second removal must be a benign no-op.
        bus.unsubscribe(TOPIC_USER_CREATED, &inbox).await;

        assert_eq!(bus.subscriber_count(TOPIC_USER_CREATED).await, 0);
    }

    #[tokio::test]
    async fn unsubscribe_leaves_other_subscriptions_in_place() {
        let bus = EventBus::default();
        let first = bus.subscribe(TOPIC_USER_CREATED).await;
        let mut second = bus.subscribe(TOPIC_USER_CREATED).await;

        bus.unsubscribe(TOPIC_USER_CREATED, &first).await;

        let delivery = bus.publish(TOPIC_USER_CREATED, created("1")).await;
        assert_eq!(delivery, Delivery { delivered: 1, dropped: 0 });
        assert_eq!(second.recv().await, Some(created("1")));
    }

    #[tokio::test]
    async fn send_to_a_closed_inbox_counts_a_drop_not_a_panic() {
        let bus = EventBus::default();
        let inbox = bus.subscribe(TOPIC_USER_UPDATED).await;

        // Drop the receiving half without unsubscribing, leaving a closed
        // sender in the registry: the shape of a send racing a teardown.
        drop(inbox);

        let payload: EventPayload = UserUpdatedPayload {
            user_id: "1".into(),
            name: None,
            email: None,
        }
        .into();
        let delivery = bus.publish(TOPIC_USER_UPDATED, payload).await;
        assert_eq!(delivery, Delivery { delivered: 0, dropped: 1 });
    }
}
