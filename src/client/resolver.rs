//! Base URL resolution with health probing and a short-lived cache.
//!
//! The configured base URL may name one service, a comma-separated list of services, or the
//! sentinel `auto`. Candidates are probed in order with `GET {candidate}/health`; the first one
//! answering with a status in `[200, 500)` wins. When nothing answers, the first candidate is used
//! anyway so the subsequent request surfaces its own error.
//!
//! The cache holds a single entry and is not keyed by the configuration string: within the TTL
//! every call returns the cached value, even when called with a different configuration.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};

use super::format_endpoint;

/// Built-in candidates used when the configuration is `auto`: internal address first.
pub const AUTO_CANDIDATES: [&str; 2] = ["http://192.168.88.51:18888", "http://47.99.246.108:18888"];

/// Default lifetime of a cached resolution.
pub const DEFAULT_RESOLVE_TTL: Duration = Duration::from_secs(60);

/// Default timeout of a single health probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(1200);

/// Result of probing one candidate's health endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Status in `[200, 500)`: the service is up, even if it rejects the probe.
    Reachable(StatusCode),
    /// A response arrived but its status is outside the accepted range.
    Rejected(StatusCode),
    /// No response: connection, timeout, or URL errors.
    Failed(String),
}

impl ProbeOutcome {
    /// Whether this outcome selects the candidate.
    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Reachable(_))
    }
}

#[derive(Debug, Clone)]
struct CachedBaseUrl {
    value: String,
    resolved_at: Instant,
}

/// Point-in-time view of the resolution cache.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionSnapshot {
    /// Cached base URL, if any.
    pub value: Option<String>,
    /// Age of the cached entry in seconds.
    pub age_secs: Option<f64>,
    /// Whether the entry would still be served without probing.
    pub fresh: bool,
    /// Configured TTL in seconds.
    pub ttl_secs: f64,
}

/// Resolves the reachable base URL and caches it for a fixed window.
pub struct BaseUrlResolver {
    http: Client,
    ttl: Duration,
    probe_timeout: Duration,
    cache: Mutex<Option<CachedBaseUrl>>,
}

impl BaseUrlResolver {
    /// Create a resolver with the default TTL and probe timeout.
    pub fn new(http: Client) -> Self {
        Self::with_settings(http, DEFAULT_RESOLVE_TTL, DEFAULT_PROBE_TIMEOUT)
    }

    /// Create a resolver with explicit timing.
    pub fn with_settings(http: Client, ttl: Duration, probe_timeout: Duration) -> Self {
        Self {
            http,
            ttl,
            probe_timeout,
            cache: Mutex::new(None),
        }
    }

    /// Return the base URL to use for `raw`, probing candidates when the cache is stale.
    pub async fn resolve(&self, raw: &str) -> String {
        if let Some(cached) = self.cached() {
            tracing::trace!(base_url = %cached, "Using cached base URL");
            return cached;
        }

        let started = Instant::now();
        let candidates = candidate_urls(raw);

        for candidate in &candidates {
            let outcome = self.probe(candidate).await;
            if outcome.is_reachable() {
                tracing::debug!(candidate = %candidate, ?outcome, "Selected reachable base URL");
                self.store(candidate.clone(), started);
                return candidate.clone();
            }
            tracing::debug!(candidate = %candidate, ?outcome, "Skipping candidate");
        }

        let chosen = candidates
            .first()
            .cloned()
            .unwrap_or_else(|| strip_base(raw));
        tracing::warn!(
            base_url = %chosen,
            candidates = candidates.len(),
            "No candidate answered the health probe; using the first one"
        );
        self.store(chosen.clone(), started);
        chosen
    }

    /// Probe `{candidate}/health`.
    pub async fn probe(&self, candidate: &str) -> ProbeOutcome {
        let url = format_endpoint(candidate, "health");
        match self
            .http
            .get(&url)
            .timeout(self.probe_timeout)
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                if (200..500).contains(&status.as_u16()) {
                    ProbeOutcome::Reachable(status)
                } else {
                    ProbeOutcome::Rejected(status)
                }
            }
            Err(error) => ProbeOutcome::Failed(error.to_string()),
        }
    }

    /// Inspect the cache without probing.
    pub fn snapshot(&self) -> ResolutionSnapshot {
        let guard = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let ttl_secs = self.ttl.as_secs_f64();
        match guard.as_ref() {
            Some(entry) => {
                let age = entry.resolved_at.elapsed();
                ResolutionSnapshot {
                    value: Some(entry.value.clone()),
                    age_secs: Some(age.as_secs_f64()),
                    fresh: !entry.value.is_empty() && age < self.ttl,
                    ttl_secs,
                }
            }
            None => ResolutionSnapshot {
                value: None,
                age_secs: None,
                fresh: false,
                ttl_secs,
            },
        }
    }

    /// Drop the cached resolution so the next call probes again.
    pub fn invalidate(&self) {
        *self.cache.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn cached(&self) -> Option<String> {
        let guard = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        guard
            .as_ref()
            .filter(|entry| !entry.value.is_empty() && entry.resolved_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    fn store(&self, value: String, resolved_at: Instant) {
        let mut guard = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(CachedBaseUrl { value, resolved_at });
    }
}

/// Expand a raw configuration string into the ordered candidate list.
pub fn candidate_urls(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.contains(',') {
        raw.split(',')
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(strip_base)
            .collect()
    } else if raw.eq_ignore_ascii_case("auto") {
        AUTO_CANDIDATES.iter().map(|url| url.to_string()).collect()
    } else {
        vec![strip_base(raw)]
    }
}

fn strip_base(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}
