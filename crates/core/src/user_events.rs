//! Payload structs for user domain events.
//!
//! One struct per destination in [`crate::topics`]. All payloads derive
//! `Serialize`/`Deserialize`; only the queue tier actually crosses a
//! serialization boundary, but keeping the derives uniform lets callers log
//! or persist any payload without special cases.

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// Payload for [`TOPIC_USER_CREATED`](crate::topics::TOPIC_USER_CREATED).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreatedPayload {
    /// Id of the newly created user.
    pub user_id: UserId,
    /// Display name as stored at creation time.
    pub name: String,
    /// Primary email address.
    pub email: String,
}

/// Payload for [`TOPIC_USER_UPDATED`](crate::topics::TOPIC_USER_UPDATED).
///
/// Fields that were not part of the update are `None` and are omitted from
/// the serialized form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdatedPayload {
    /// Id of the updated user.
    pub user_id: UserId,
    /// New display name, if it changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New email address, if it changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Payload for [`TOPIC_USER_DELETED`](crate::topics::TOPIC_USER_DELETED)
/// and for [`TASK_USER_DELETED`](crate::topics::TASK_USER_DELETED).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDeletedPayload {
    /// Id of the deleted user.
    pub user_id: UserId,
}

/// Payload for
/// [`TASK_SEND_WELCOME_EMAIL`](crate::topics::TASK_SEND_WELCOME_EMAIL).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WelcomeEmailPayload {
    /// Id of the user to greet.
    pub user_id: UserId,
    /// Address the welcome email is sent to.
    pub email: String,
    /// Name used in the email salutation.
    pub name: String,
}
