//! Event catalog: the closed mapping from destination names to payload shapes.
//!
//! Destinations come in two catalogs sharing one namespace of strings:
//! bus-tier topics ([`topic_payload_kind`]) and queue-tier task names
//! ([`task_payload_kind`]). Each destination expects exactly one
//! [`PayloadKind`]; both publisher variants reject a payload whose kind does
//! not match *before* any delivery attempt.

use std::fmt;

use relay_core::topics::{
    TASK_SEND_WELCOME_EMAIL, TASK_USER_DELETED, TOPIC_USER_CREATED, TOPIC_USER_DELETED,
    TOPIC_USER_UPDATED,
};
use relay_core::user_events::{
    UserCreatedPayload, UserDeletedPayload, UserUpdatedPayload, WelcomeEmailPayload,
};

// ---------------------------------------------------------------------------
// PayloadKind
// ---------------------------------------------------------------------------

/// Runtime tag naming one payload shape from the closed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    UserCreated,
    UserUpdated,
    UserDeleted,
    WelcomeEmail,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PayloadKind::UserCreated => "UserCreatedPayload",
            PayloadKind::UserUpdated => "UserUpdatedPayload",
            PayloadKind::UserDeleted => "UserDeletedPayload",
            PayloadKind::WelcomeEmail => "WelcomeEmailPayload",
        })
    }
}

// ---------------------------------------------------------------------------
// EventPayload
// ---------------------------------------------------------------------------

/// Tagged union over every payload shape the event system carries.
///
/// The bus moves these values around in-process without serialization; only
/// [`to_json_bytes`](EventPayload::to_json_bytes) crosses a byte boundary,
/// and it serializes the *inner* struct so the queue backend never sees the
/// enum tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    UserCreated(UserCreatedPayload),
    UserUpdated(UserUpdatedPayload),
    UserDeleted(UserDeletedPayload),
    WelcomeEmail(WelcomeEmailPayload),
}

impl EventPayload {
    /// The runtime tag of this payload.
    pub fn kind(&self) -> PayloadKind {
        match self {
            EventPayload::UserCreated(_) => PayloadKind::UserCreated,
            EventPayload::UserUpdated(_) => PayloadKind::UserUpdated,
            EventPayload::UserDeleted(_) => PayloadKind::UserDeleted,
            EventPayload::WelcomeEmail(_) => PayloadKind::WelcomeEmail,
        }
    }

    /// Serialize the inner payload struct to JSON bytes for the queue-tier
    /// wire.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        match self {
            EventPayload::UserCreated(p) => serde_json::to_vec(p),
            EventPayload::UserUpdated(p) => serde_json::to_vec(p),
            EventPayload::UserDeleted(p) => serde_json::to_vec(p),
            EventPayload::WelcomeEmail(p) => serde_json::to_vec(p),
        }
    }
}

impl From<UserCreatedPayload> for EventPayload {
    fn from(p: UserCreatedPayload) -> Self {
        EventPayload::UserCreated(p)
    }
}

impl From<UserUpdatedPayload> for EventPayload {
    fn from(p: UserUpdatedPayload) -> Self {
        EventPayload::UserUpdated(p)
    }
}

impl From<UserDeletedPayload> for EventPayload {
    fn from(p: UserDeletedPayload) -> Self {
        EventPayload::UserDeleted(p)
    }
}

impl From<WelcomeEmailPayload> for EventPayload {
    fn from(p: WelcomeEmailPayload) -> Self {
        EventPayload::WelcomeEmail(p)
    }
}

// ---------------------------------------------------------------------------
// Catalog lookups
// ---------------------------------------------------------------------------

/// Expected payload kind for a bus-tier topic, or `None` if the string is
/// not a known topic.
pub fn topic_payload_kind(topic: &str) -> Option<PayloadKind> {
    match topic {
        TOPIC_USER_CREATED => Some(PayloadKind::UserCreated),
        TOPIC_USER_UPDATED => Some(PayloadKind::UserUpdated),
        TOPIC_USER_DELETED => Some(PayloadKind::UserDeleted),
        _ => None,
    }
}

/// Expected payload kind for a queue-tier task name, or `None` if the string
/// is not a known task name.
pub fn task_payload_kind(task_name: &str) -> Option<PayloadKind> {
    match task_name {
        TASK_SEND_WELCOME_EMAIL => Some(PayloadKind::WelcomeEmail),
        TASK_USER_DELETED => Some(PayloadKind::UserDeleted),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
