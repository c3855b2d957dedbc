//! HTTP client for the remote memory service.
//!
//! The client owns a single `reqwest::Client` with redirects disabled; the resolver, the retry
//! wrapper, and the credential validator all share its connection pool.

pub mod resolver;
pub mod retry;
pub mod types;
pub mod validate;

use reqwest::{Client, redirect::Policy};

pub use resolver::{AUTO_CANDIDATES, BaseUrlResolver, ProbeOutcome, ResolutionSnapshot};
pub use types::{HttpSuccess, MemoryServiceError, RequestFailure, RetryPolicy};
pub use validate::CredentialValidationError;

/// Lightweight HTTP client for memory-service operations.
#[derive(Clone)]
pub struct MemoryServiceClient {
    pub(crate) http: Client,
}

impl MemoryServiceClient {
    /// Construct a client with the default user agent and no redirect following.
    pub fn new() -> Result<Self, MemoryServiceError> {
        let http = build_http_client("mem-dm/0.1")
            .map_err(|error| MemoryServiceError::Unexpected(error.to_string()))?;
        tracing::debug!("Initialized memory service HTTP client");
        Ok(Self { http })
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_http(http: Client) -> Self {
        Self { http }
    }

    /// Borrow the underlying HTTP client.
    pub fn http(&self) -> &Client {
        &self.http
    }
}

/// Build the shared `reqwest::Client`; redirects are surfaced as statuses, never followed.
pub fn build_http_client(user_agent: &str) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .redirect(Policy::none())
        .build()
}

/// Join a base URL and a path with exactly one slash between them.
pub(crate) fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
