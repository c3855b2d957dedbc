//! Shared types used by the memory-service client and its helpers.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Maximum number of characters kept from a response body in error details.
pub(crate) const BODY_PREVIEW_CHARS: usize = 200;

/// Errors returned while talking to the memory service.
#[derive(Debug, Clone, Error)]
pub enum MemoryServiceError {
    /// No usable base URL was configured.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Connecting or reading timed out or was refused.
    #[error("network timeout/connect error: {0}")]
    Network(String),
    /// The service rejected the request (4xx, or any other non-success status below 500).
    #[error("HTTP {status} | detail={detail}")]
    ClientStatus {
        /// HTTP status returned by the service.
        status: u16,
        /// `detail` field of a JSON body, or a truncated body preview.
        detail: String,
    },
    /// The service failed while handling the request (5xx).
    #[error("HTTP {status} | detail={detail}")]
    ServerStatus {
        /// HTTP status returned by the service.
        status: u16,
        /// `detail` field of a JSON body, or a truncated body preview.
        detail: String,
    },
    /// Any other transport failure.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl MemoryServiceError {
    /// Whether another attempt may succeed (5xx or network failures).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::ServerStatus { .. })
    }

    /// Classify a non-success response by status and body text.
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = extract_detail(body);
        if status.is_server_error() {
            Self::ServerStatus {
                status: status.as_u16(),
                detail,
            }
        } else {
            Self::ClientStatus {
                status: status.as_u16(),
                detail,
            }
        }
    }

    /// Classify a transport error raised by `reqwest`.
    pub(crate) fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            Self::Network(error.to_string())
        } else {
            Self::Unexpected(error.to_string())
        }
    }
}

/// Attempt budget and pacing for outbound POST requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_retries: u32,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Backoff unit; attempt `n` sleeps `backoff_base * n` before the next try.
    pub backoff_base: Duration,
}

impl RetryPolicy {
    /// Policy for `POST /memories/async`, which is expected to answer quickly.
    pub const fn add_memory() -> Self {
        Self {
            max_retries: 3,
            timeout: Duration::from_secs(6),
            backoff_base: Duration::from_millis(600),
        }
    }

    /// Policy for `POST /search`.
    pub const fn search() -> Self {
        Self {
            max_retries: 3,
            timeout: Duration::from_secs(10),
            backoff_base: Duration::from_millis(600),
        }
    }

    /// Delay taken after a failed `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(attempt)
    }
}

/// Successful (2xx) response returned by the retry wrapper.
#[derive(Debug, Clone)]
pub struct HttpSuccess {
    /// HTTP status of the final response.
    pub status: StatusCode,
    /// Parsed JSON body, or `{ "raw": <preview> }` when the body is not JSON.
    pub body: Value,
    /// Number of requests issued.
    pub attempts: u32,
    /// Number of backoff sleeps taken.
    pub backoffs: u32,
}

/// Terminal failure of the retry wrapper.
#[derive(Debug, Clone, Error)]
#[error("url={url} | error={error}")]
pub struct RequestFailure {
    /// Endpoint that was called.
    pub url: String,
    /// Last error recorded before giving up.
    pub error: MemoryServiceError,
    /// Number of requests issued.
    pub attempts: u32,
    /// Number of backoff sleeps taken.
    pub backoffs: u32,
}

/// Keep at most `max_chars` characters of `text`.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Pull the `detail` field out of a JSON object body, falling back to a body preview.
pub(crate) fn extract_detail(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("detail") {
            None | Some(Value::Null) => "None".to_string(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        },
        _ => truncate_chars(body, BODY_PREVIEW_CHARS),
    }
}
