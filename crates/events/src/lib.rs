//! Dual-tier event distribution for the relay platform.
//!
//! This crate routes domain events along two delivery tiers with different
//! durability and latency guarantees, behind one [`Publisher`] interface:
//!
//! - [`bus`] — topic-addressed in-process fan-out with bounded per-subscriber
//!   inboxes and a drop-on-full backpressure policy (best-effort tier).
//! - [`queue`] — boundary to the external reliable-enqueue service that
//!   durably retries delivery (must-happen tier).
//! - [`catalog`] — the closed mapping from destination names to payload
//!   shapes, enforced before any delivery attempt.
//! - [`publisher`] — [`BusPublisher`] and [`QueuePublisher`], the two
//!   variants of the uniform publish capability.
//! - [`supervisor`] — cancellable per-topic consumption loops.
//! - [`subscribers`] — built-in consumers for the user domain topics.
//!
//! The bus is constructed once in the composition root and shared as
//! `Arc<EventBus>`; there is deliberately no hidden global instance.

pub mod bus;
pub mod catalog;
pub mod publisher;
pub mod queue;
pub mod subscribers;
pub mod supervisor;

pub use bus::{Delivery, EventBus, Inbox, INBOX_CAPACITY};
pub use catalog::{task_payload_kind, topic_payload_kind, EventPayload, PayloadKind};
pub use publisher::{BusPublisher, PublishError, Publisher, QueuePublisher};
pub use queue::{
    EnqueueError, EnqueueOptions, EnqueueReceipt, HttpTaskQueue, QueueConfig, TaskQueue,
    DEFAULT_MAX_RETRY, QUEUE_CLASS_CRITICAL,
};
pub use supervisor::{SideEffectError, Subscriber, SubscriberSupervisor, SupervisorHandle};
