//! Uniform publisher abstraction over both delivery tiers.
//!
//! Producers call [`Publisher::publish`] with a destination string and a
//! payload; which tier the call lands on is decided by the publisher
//! variant they were handed, not by the call site:
//!
//! - [`BusPublisher`] — volatile in-process fan-out. Use for events where
//!   losing a notification under load is acceptable (cache invalidation,
//!   metrics, non-critical fan-out).
//! - [`QueuePublisher`] — durable, retried delivery through the external
//!   queue backend. Use for events that must eventually cause an effect
//!   (outbound notifications, cross-system side effects), even across
//!   process restarts.
//!
//! Both variants validate the destination and the payload shape against the
//! event catalog *before* any delivery attempt.

use std::sync::Arc;

use async_trait::async_trait;

use crate::bus::EventBus;
use crate::catalog::{task_payload_kind, topic_payload_kind, EventPayload, PayloadKind};
use crate::queue::{EnqueueError, EnqueueOptions, TaskQueue};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for publish failures.
///
/// The first two variants are caller errors and are never retried. Bus-tier
/// delivery drops are *not* represented here; they are diagnostics internal
/// to that tier.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The destination string is in neither catalog this publisher serves.
    #[error("unsupported destination: {0}")]
    UnsupportedDestination(String),

    /// The payload's shape does not match the catalog entry for the
    /// destination.
    #[error("invalid payload type for {destination}: expected {expected}, got {got}")]
    InvalidPayloadType {
        destination: String,
        expected: PayloadKind,
        got: PayloadKind,
    },

    /// The external queue backend rejected or could not accept the task.
    #[error("failed to enqueue task {task_name}: {source}")]
    EnqueueFailed {
        task_name: String,
        #[source]
        source: EnqueueError,
    },
}

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

/// The one capability producers depend on.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Deliver `payload` to `destination`, or explain why it cannot be.
    async fn publish(&self, destination: &str, payload: EventPayload) -> Result<(), PublishError>;
}

/// Check a payload's kind against the catalog entry for `destination`.
fn check_payload_kind(
    destination: &str,
    expected: PayloadKind,
    payload: &EventPayload,
) -> Result<(), PublishError> {
    let got = payload.kind();
    if got != expected {
        return Err(PublishError::InvalidPayloadType {
            destination: destination.to_string(),
            expected,
            got,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// BusPublisher
// ---------------------------------------------------------------------------

/// Publisher variant backed by the in-process [`EventBus`].
pub struct BusPublisher {
    bus: Arc<EventBus>,
}

impl BusPublisher {
    /// Create a publisher that fans out on the given bus.
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self { bus }
    }
}

#[async_trait]
impl Publisher for BusPublisher {
    async fn publish(&self, destination: &str, payload: EventPayload) -> Result<(), PublishError> {
        let expected = topic_payload_kind(destination)
            .ok_or_else(|| PublishError::UnsupportedDestination(destination.to_string()))?;
        check_payload_kind(destination, expected, &payload)?;

        let delivery = self.bus.publish(destination, payload).await;
        tracing::debug!(
            topic = destination,
            delivered = delivery.delivered,
            dropped = delivery.dropped,
            "Published bus event"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// QueuePublisher
// ---------------------------------------------------------------------------

/// Publisher variant that forwards to the external reliable-enqueue service.
///
/// Does not retry on its own; retry is the queue backend's responsibility.
/// Each task is tagged with the default options (critical queue class,
/// bounded retry count) so the backend can prioritize it over best-effort
/// work.
pub struct QueuePublisher {
    queue: Arc<dyn TaskQueue>,
}

impl QueuePublisher {
    /// Create a publisher that enqueues on the given backend client.
    pub fn new(queue: Arc<dyn TaskQueue>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl Publisher for QueuePublisher {
    async fn publish(&self, destination: &str, payload: EventPayload) -> Result<(), PublishError> {
        let expected = task_payload_kind(destination)
            .ok_or_else(|| PublishError::UnsupportedDestination(destination.to_string()))?;
        check_payload_kind(destination, expected, &payload)?;

        let bytes = payload
            .to_json_bytes()
            .map_err(|e| PublishError::EnqueueFailed {
                task_name: destination.to_string(),
                source: EnqueueError::Payload(e),
            })?;

        let receipt = self
            .queue
            .enqueue(destination, &bytes, &EnqueueOptions::default())
            .await
            .map_err(|source| PublishError::EnqueueFailed {
                task_name: destination.to_string(),
                source,
            })?;

        tracing::debug!(
            task_id = %receipt.task_id,
            queue = %receipt.queue,
            task_name = destination,
            "Enqueued task"
        );
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use relay_core::topics::{TASK_SEND_WELCOME_EMAIL, TOPIC_USER_CREATED};
    use relay_core::user_events::{UserCreatedPayload, UserDeletedPayload, WelcomeEmailPayload};
    use tokio::sync::Mutex;

    use crate::queue::EnqueueReceipt;

    use super::*;

    fn created_payload() -> EventPayload {
        UserCreatedPayload {
            user_id: "1".into(),
            name: "Ann".into(),
            email: "a@x.com".into(),
        }
        .into()
    }

    fn welcome_payload() -> EventPayload {
        WelcomeEmailPayload {
            user_id: "1".into(),
            email: "a@x.com".into(),
            name: "Ann".into(),
        }
        .into()
    }

    // -----------------------------------------------------------------------
    // Bus tier
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn bus_publisher_delivers_valid_payloads() {
        let bus = Arc::new(EventBus::default());
        let mut inbox = bus.subscribe(TOPIC_USER_CREATED).await;
        let publisher = BusPublisher::new(Arc::clone(&bus));

        publisher
            .publish(TOPIC_USER_CREATED, created_payload())
            .await
            .expect("valid publish should succeed");

        assert_eq!(inbox.recv().await, Some(created_payload()));
    }

    #[tokio::test]
    async fn bus_publisher_rejects_unknown_topics() {
        let bus = Arc::new(EventBus::default());
        let publisher = BusPublisher::new(bus);

        let err = publisher
            .publish("order.created", created_payload())
            .await
            .unwrap_err();

        assert_matches!(err, PublishError::UnsupportedDestination(d) if d == "order.created");
    }

    #[tokio::test]
    async fn bus_publisher_rejects_mismatched_payloads_before_fan_out() {
        let bus = Arc::new(EventBus::default());
        let mut inbox = bus.subscribe(TOPIC_USER_CREATED).await;
        let publisher = BusPublisher::new(Arc::clone(&bus));

        let wrong: EventPayload = UserDeletedPayload { user_id: "1".into() }.into();
        let err = publisher
            .publish(TOPIC_USER_CREATED, wrong)
            .await
            .unwrap_err();

        assert_matches!(
            err,
            PublishError::InvalidPayloadType {
                expected: PayloadKind::UserCreated,
                got: PayloadKind::UserDeleted,
                ..
            }
        );
        // Fail-fast: nothing reached the subscriber.
        bus.unsubscribe(TOPIC_USER_CREATED, &inbox).await;
        assert_eq!(inbox.recv().await, None);
    }

    #[tokio::test]
    async fn bus_publisher_succeeds_with_zero_subscribers() {
        let bus = Arc::new(EventBus::default());
        let publisher = BusPublisher::new(bus);

        publisher
            .publish(TOPIC_USER_CREATED, created_payload())
            .await
            .expect("zero subscribers is not a publish failure");
    }

    // -----------------------------------------------------------------------
    // Queue tier
    // -----------------------------------------------------------------------

    /// Test double recording every enqueue request it accepts.
    #[derive(Default)]
    struct RecordingQueue {
        requests: Mutex<Vec<(String, Vec<u8>, EnqueueOptions)>>,
    }

    #[async_trait]
    impl TaskQueue for RecordingQueue {
        async fn enqueue(
            &self,
            task_name: &str,
            payload: &[u8],
            options: &EnqueueOptions,
        ) -> Result<EnqueueReceipt, EnqueueError> {
            self.requests.lock().await.push((
                task_name.to_string(),
                payload.to_vec(),
                options.clone(),
            ));
            Ok(EnqueueReceipt {
                task_id: "t-1".into(),
                queue: options.queue_class.clone(),
            })
        }
    }

    /// Test double that refuses every request.
    struct RejectingQueue;

    #[async_trait]
    impl TaskQueue for RejectingQueue {
        async fn enqueue(
            &self,
            _task_name: &str,
            _payload: &[u8],
            _options: &EnqueueOptions,
        ) -> Result<EnqueueReceipt, EnqueueError> {
            Err(EnqueueError::HttpStatus(503))
        }
    }

    #[tokio::test]
    async fn queue_publisher_enqueues_with_critical_class_and_bounded_retry() {
        let queue = Arc::new(RecordingQueue::default());
        let publisher = QueuePublisher::new(Arc::clone(&queue) as Arc<dyn TaskQueue>);

        publisher
            .publish(TASK_SEND_WELCOME_EMAIL, welcome_payload())
            .await
            .expect("enqueue should be acknowledged");

        let requests = queue.requests.lock().await;
        assert_eq!(requests.len(), 1);

        let (task_name, payload, options) = &requests[0];
        assert_eq!(task_name, TASK_SEND_WELCOME_EMAIL);
        assert_eq!(options.queue_class, "critical");
        assert_eq!(options.max_retry, 3);

        let value: serde_json::Value = serde_json::from_slice(payload).unwrap();
        assert_eq!(value["user_id"], "1");
        assert_eq!(value["email"], "a@x.com");
    }

    #[tokio::test]
    async fn queue_publisher_rejects_unknown_task_names() {
        let publisher = QueuePublisher::new(Arc::new(RecordingQueue::default()));

        let err = publisher
            .publish("order:ship", welcome_payload())
            .await
            .unwrap_err();

        assert_matches!(err, PublishError::UnsupportedDestination(d) if d == "order:ship");
    }

    #[tokio::test]
    async fn queue_publisher_rejects_mismatched_payloads_before_enqueue() {
        let queue = Arc::new(RecordingQueue::default());
        let publisher = QueuePublisher::new(Arc::clone(&queue) as Arc<dyn TaskQueue>);

        let err = publisher
            .publish(TASK_SEND_WELCOME_EMAIL, created_payload())
            .await
            .unwrap_err();

        assert_matches!(err, PublishError::InvalidPayloadType { .. });
        assert!(queue.requests.lock().await.is_empty());
    }

    #[tokio::test]
    async fn queue_publisher_surfaces_backend_rejection() {
        let publisher = QueuePublisher::new(Arc::new(RejectingQueue));

        let err = publisher
            .publish(TASK_SEND_WELCOME_EMAIL, welcome_payload())
            .await
            .unwrap_err();

        assert_matches!(
            err,
            PublishError::EnqueueFailed {
                source: EnqueueError::HttpStatus(503),
                ..
            }
        );
    }
}
