//! Built-in subscribers for the user domain topics.
//!
//! Reference consumers wired by [`user_subscriptions`]: each reacts to one
//! user topic with a short internal side effect. Applications with real
//! side effects register their own [`Subscriber`] implementations instead.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use relay_core::topics::{TOPIC_USER_CREATED, TOPIC_USER_DELETED, TOPIC_USER_UPDATED};

use crate::catalog::EventPayload;
use crate::supervisor::{SideEffectError, Subscriber};

/// Simulated duration of each built-in side effect.
const SIDE_EFFECT_DURATION: Duration = Duration::from_millis(50);

/// Runs the post-creation action for every new user.
pub struct UserOnboarding;

#[async_trait]
impl Subscriber for UserOnboarding {
    fn name(&self) -> &'static str {
        "user-onboarding"
    }

    async fn handle(&self, payload: EventPayload) -> Result<(), SideEffectError> {
        let EventPayload::UserCreated(p) = payload else {
            return Ok(());
        };
        tracing::info!(
            user_id = %p.user_id,
            name = %p.name,
            "Running post-creation action for new user"
        );
        tokio::time::sleep(SIDE_EFFECT_DURATION).await;
        tracing::info!(user_id = %p.user_id, "Post-creation action complete");
        Ok(())
    }
}

/// Refreshes the internal user cache after profile changes.
pub struct UserCacheRefresher;

#[async_trait]
impl Subscriber for UserCacheRefresher {
    fn name(&self) -> &'static str {
        "user-cache-refresher"
    }

    async fn handle(&self, payload: EventPayload) -> Result<(), SideEffectError> {
        let EventPayload::UserUpdated(p) = payload else {
            return Ok(());
        };
        tracing::info!(user_id = %p.user_id, "Refreshing internal user cache");
        tokio::time::sleep(SIDE_EFFECT_DURATION).await;
        Ok(())
    }
}

/// Cleans up data related to a deleted user.
pub struct UserCleanup;

#[async_trait]
impl Subscriber for UserCleanup {
    fn name(&self) -> &'static str {
        "user-cleanup"
    }

    async fn handle(&self, payload: EventPayload) -> Result<(), SideEffectError> {
        let EventPayload::UserDeleted(p) = payload else {
            return Ok(());
        };
        tracing::info!(user_id = %p.user_id, "Cleaning up data for deleted user");
        tokio::time::sleep(SIDE_EFFECT_DURATION).await;
        Ok(())
    }
}

/// The (topic, subscriber) wiring for all built-in user subscribers.
///
/// Feed these to
/// [`SubscriberSupervisor::register`](crate::supervisor::SubscriberSupervisor::register)
/// at startup.
pub fn user_subscriptions() -> Vec<(&'static str, Arc<dyn Subscriber>)> {
    vec![
        (TOPIC_USER_CREATED, Arc::new(UserOnboarding) as _),
        (TOPIC_USER_UPDATED, Arc::new(UserCacheRefresher) as _),
        (TOPIC_USER_DELETED, Arc::new(UserCleanup) as _),
    ]
}
