//! Reliable-enqueue service boundary.
//!
//! The durable queue backend is an external collaborator: it persists
//! accepted tasks and retries their delivery up to a bounded count before
//! giving up. This module defines the [`TaskQueue`] trait the rest of the
//! crate programs against, plus [`HttpTaskQueue`], the production client
//! that submits enqueue requests over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

/// Queue class for tasks that must not be starved by best-effort work.
pub const QUEUE_CLASS_CRITICAL: &str = "critical";

/// Bounded number of delivery attempts requested from the backend.
pub const DEFAULT_MAX_RETRY: u32 = 3;

/// HTTP request timeout for a single enqueue attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Options / receipt
// ---------------------------------------------------------------------------

/// Per-task options forwarded with the enqueue request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnqueueOptions {
    /// Backend queue class the task is tagged with.
    pub queue_class: String,
    /// How many delivery attempts the backend may make before giving up.
    pub max_retry: u32,
}

impl Default for EnqueueOptions {
    fn default() -> Self {
        Self {
            queue_class: QUEUE_CLASS_CRITICAL.to_string(),
            max_retry: DEFAULT_MAX_RETRY,
        }
    }
}

/// The backend's acknowledgment of an accepted task.
#[derive(Debug, Clone, Deserialize)]
pub struct EnqueueReceipt {
    /// Backend-assigned task id.
    pub task_id: String,
    /// Queue the task was placed on.
    pub queue: String,
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for enqueue failures.
///
/// Any variant means the backend did not acknowledge the task; the backend's
/// own bounded retries happen only after acceptance.
#[derive(Debug, thiserror::Error)]
pub enum EnqueueError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The enqueue service returned a non-2xx status code.
    #[error("enqueue service returned HTTP {0}")]
    HttpStatus(u16),

    /// The payload bytes were not valid JSON for the wire envelope.
    #[error("payload is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// TaskQueue
// ---------------------------------------------------------------------------

/// Boundary to the external reliable-enqueue service.
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Submit one task for durable, retried delivery.
    async fn enqueue(
        &self,
        task_name: &str,
        payload: &[u8],
        options: &EnqueueOptions,
    ) -> Result<EnqueueReceipt, EnqueueError>;
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Enqueue client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// URL the enqueue envelope is POSTed to.
    pub enqueue_url: String,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl QueueConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                          |
    /// |------------------------------|----------------------------------|
    /// | `QUEUE_URL`                  | `http://localhost:8090/enqueue`  |
    /// | `QUEUE_REQUEST_TIMEOUT_SECS` | `10`                             |
    pub fn from_env() -> Self {
        let enqueue_url = std::env::var("QUEUE_URL")
            .unwrap_or_else(|_| "http://localhost:8090/enqueue".into());

        let request_timeout_secs: u64 = std::env::var("QUEUE_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".into())
            .parse()
            .expect("QUEUE_REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            enqueue_url,
            request_timeout_secs,
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            enqueue_url: "http://localhost:8090/enqueue".into(),
            request_timeout_secs: REQUEST_TIMEOUT.as_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// HttpTaskQueue
// ---------------------------------------------------------------------------

/// HTTP client for the reliable-enqueue service.
///
/// Sends `{task_name, payload, queue, max_retry}` as JSON and expects a
/// `{task_id, queue}` acknowledgment. Transport-level retry is deliberately
/// absent here: once the backend accepts the task, *it* owns retrying the
/// actual delivery.
pub struct HttpTaskQueue {
    client: reqwest::Client,
    enqueue_url: String,
}

impl HttpTaskQueue {
    /// Create a new client from the given configuration.
    pub fn new(config: QueueConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            enqueue_url: config.enqueue_url,
        }
    }
}

impl Default for HttpTaskQueue {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}

#[async_trait]
impl TaskQueue for HttpTaskQueue {
    async fn enqueue(
        &self,
        task_name: &str,
        payload: &[u8],
        options: &EnqueueOptions,
    ) -> Result<EnqueueReceipt, EnqueueError> {
        let payload: serde_json::Value = serde_json::from_slice(payload)?;
        let envelope = serde_json::json!({
            "task_name": task_name,
            "payload": payload,
            "queue": options.queue_class,
            "max_retry": options.max_retry,
        });

        let response = self
            .client
            .post(&self.enqueue_url)
            .json(&envelope)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(EnqueueError::HttpStatus(response.status().as_u16()));
        }

        let receipt: EnqueueReceipt = response.json().await?;
        tracing::info!(
            task_id = %receipt.task_id,
            queue = %receipt.queue,
            task_name,
            "Task accepted by queue backend"
        );
        Ok(receipt)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_does_not_panic() {
        let _queue = HttpTaskQueue::new(QueueConfig::default());
    }

    #[test]
    fn default_options_request_critical_with_bounded_retry() {
        let options = EnqueueOptions::default();
        assert_eq!(options.queue_class, QUEUE_CLASS_CRITICAL);
        assert_eq!(options.max_retry, DEFAULT_MAX_RETRY);
    }

    #[test]
    fn receipt_deserializes_from_backend_acknowledgment() {
        let receipt: EnqueueReceipt =
            serde_json::from_str(r#"{"task_id":"t-123","queue":"critical"}"#).unwrap();
        assert_eq!(receipt.task_id, "t-123");
        assert_eq!(receipt.queue, "critical");
    }

    #[test]
    fn enqueue_error_display_http_status() {
        let err = EnqueueError::HttpStatus(503);
        assert_eq!(err.to_string(), "enqueue service returned HTTP 503");
    }

    #[test]
    fn enqueue_error_display_payload() {
        let json_err = serde_json::from_slice::<serde_json::Value>(b"not json").unwrap_err();
        let err = EnqueueError::Payload(json_err);
        assert!(err.to_string().contains("payload is not valid JSON"));
    }
}
