//! Well-known destination name constants.
//!
//! These must match the destination strings used by producers and by the
//! event catalog in `relay-events`. Destinations are drawn from this closed
//! set; callers must not invent ad-hoc strings.
//!
//! Dot-separated names are bus-tier topics (volatile, best-effort in-process
//! fan-out). Colon-separated names are queue-tier task names (durable,
//! retried by the external queue backend).

/// A user account was created.
pub const TOPIC_USER_CREATED: &str = "user.created";

/// A user account was updated.
pub const TOPIC_USER_UPDATED: &str = "user.updated";

/// A user account was deleted.
pub const TOPIC_USER_DELETED: &str = "user.deleted";

/// Send the welcome email to a newly created user.
pub const TASK_SEND_WELCOME_EMAIL: &str = "user:send_welcome_email";

/// Propagate a user deletion to downstream systems.
pub const TASK_USER_DELETED: &str = "user:deleted_high_importance";
