use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing tool activity.
#[derive(Default)]
pub struct ToolMetrics {
    add_invocations: AtomicU64,
    retrieve_invocations: AtomicU64,
    retries: AtomicU64,
    failed_requests: AtomicU64,
}

impl ToolMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an invocation of the add-memory tool.
    pub fn record_add(&self) {
        self.add_invocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an invocation of the retrieve-memory tool.
    pub fn record_retrieve(&self) {
        self.retrieve_invocations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record backoff sleeps taken while retrying a request.
    pub fn record_retries(&self, count: u64) {
        if count > 0 {
            self.retries.fetch_add(count, Ordering::Relaxed);
        }
    }

    /// Record an outbound request that ended in an error payload.
    pub fn record_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            add_invocations: self.add_invocations.load(Ordering::Relaxed),
            retrieve_invocations: self.retrieve_invocations.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of tool counters used for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of add-memory invocations since startup.
    pub add_invocations: u64,
    /// Number of retrieve-memory invocations since startup.
    pub retrieve_invocations: u64,
    /// Backoff sleeps taken across all requests.
    pub retries: u64,
    /// Requests that ended in an error payload.
    pub failed_requests: u64,
}
