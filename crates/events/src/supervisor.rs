//! Subscriber supervision: one cancellable consumption loop per topic.
//!
//! [`SubscriberSupervisor`] owns the lifecycle of long-running consumption
//! loops. Each registered (topic, subscriber) pair gets its own task that
//! subscribes on the bus, waits on either a payload or the parent
//! [`CancellationToken`], and runs the subscriber's side effect for each
//! well-typed payload. Loops are independent: one subscriber's slow side
//! effect never blocks another's.
//!
//! Shutdown is cooperative. Cancellation is observed at the loop's single
//! suspension point, so a side effect already in flight finishes its unit of
//! work first; buffered-but-unconsumed payloads are then abandoned, matching
//! the bus's non-durable delivery contract.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::bus::EventBus;
use crate::catalog::{topic_payload_kind, EventPayload, PayloadKind};

/// Error type side effects may fail with; failures are logged, never fatal
/// to the loop.
pub type SideEffectError = Box<dyn std::error::Error + Send + Sync>;

// ---------------------------------------------------------------------------
// Subscriber
// ---------------------------------------------------------------------------

/// A side effect to run for every payload consumed from one topic.
#[async_trait]
pub trait Subscriber: Send + Sync {
    /// Stable name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Run the side effect for one payload.
    async fn handle(&self, payload: EventPayload) -> Result<(), SideEffectError>;
}

// ---------------------------------------------------------------------------
// SubscriberSupervisor
// ---------------------------------------------------------------------------

/// Builds and starts the consumption loops for a set of subscriptions.
pub struct SubscriberSupervisor {
    bus: Arc<EventBus>,
    registrations: Vec<(String, Arc<dyn Subscriber>)>,
}

impl SubscriberSupervisor {
    /// Create a supervisor over the given bus with no registrations yet.
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            bus,
            registrations: Vec::new(),
        }
    }

    /// Register a subscriber to consume `topic`.
    ///
    /// The same topic may be registered more than once; each registration
    /// gets its own inbox and loop.
    pub fn register(&mut self, topic: impl Into<String>, subscriber: Arc<dyn Subscriber>) {
        self.registrations.push((topic.into(), subscriber));
    }

    /// Spawn one consumption loop per registration under `cancel`.
    ///
    /// Loops run until the token is cancelled (or their inbox reaches
    /// end-of-stream) and unsubscribe from the bus on the way out.
    pub fn spawn(self, cancel: CancellationToken) -> SupervisorHandle {
        let mut loops = Vec::with_capacity(self.registrations.len());
        for (topic, subscriber) in self.registrations {
            let bus = Arc::clone(&self.bus);
            let cancel = cancel.clone();
            loops.push(tokio::spawn(consume_loop(bus, topic, subscriber, cancel)));
        }
        SupervisorHandle { loops }
    }
}

/// Join handles for the running consumption loops.
pub struct SupervisorHandle {
    loops: Vec<JoinHandle<()>>,
}

impl SupervisorHandle {
    /// Number of consumption loops that were started.
    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    /// Wait for every loop to stop.
    ///
    /// Returns promptly once the parent token is cancelled: each loop only
    /// has to finish at most one in-flight side effect.
    pub async fn join(self) {
        for handle in self.loops {
            let _ = handle.await;
        }
    }
}

// ---------------------------------------------------------------------------
// Consumption loop
// ---------------------------------------------------------------------------

/// Run a single subscriber's consume loop until cancellation or
/// end-of-stream.
async fn consume_loop(
    bus: Arc<EventBus>,
    topic: String,
    subscriber: Arc<dyn Subscriber>,
    cancel: CancellationToken,
) {
    let expected = topic_payload_kind(&topic);
    let mut inbox = bus.subscribe(&topic).await;
    tracing::info!(
        topic = %topic,
        subscriber = subscriber.name(),
        "Subscriber loop listening"
    );

    loop {
        tokio::select! {
            // Cancellation wins over buffered payloads: once the parent
            // scope is cancelled, nothing further reaches the side effect.
            biased;

            _ = cancel.cancelled() => {
                tracing::info!(
                    topic = %topic,
                    subscriber = subscriber.name(),
                    "Subscriber loop cancelled"
                );
                break;
            }
            received = inbox.recv() => match received {
                Some(payload) => {
                    process(&topic, subscriber.as_ref(), expected, payload).await;
                }
                None => {
                    tracing::info!(
                        topic = %topic,
                        subscriber = subscriber.name(),
                        "Inbox closed, subscriber loop shutting down"
                    );
                    break;
                }
            }
        }
    }

    bus.unsubscribe(&topic, &inbox).await;
}

/// Type-check one consumed payload and run the side effect.
///
/// A payload whose kind does not match the topic's catalog entry is logged
/// and discarded; a failing side effect is logged. Neither stops the loop.
async fn process(
    topic: &str,
    subscriber: &dyn Subscriber,
    expected: Option<PayloadKind>,
    payload: EventPayload,
) {
    if let Some(expected) = expected {
        let got = payload.kind();
        if got != expected {
            tracing::warn!(
                topic,
                subscriber = subscriber.name(),
                expected = %expected,
                got = %got,
                "Discarding consumed payload with unexpected type"
            );
            return;
        }
    }

    if let Err(e) = subscriber.handle(payload).await {
        tracing::error!(
            topic,
            subscriber = subscriber.name(),
            error = %e,
            "Subscriber side effect failed"
        );
    }
}
