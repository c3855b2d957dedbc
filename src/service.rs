//! Tool service coordinating base URL resolution, outbound requests, and metrics.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    client::{
        BaseUrlResolver, CredentialValidationError, MemoryServiceClient, MemoryServiceError,
        RequestFailure, ResolutionSnapshot, RetryPolicy, format_endpoint,
        resolver::{DEFAULT_PROBE_TIMEOUT, DEFAULT_RESOLVE_TTL},
    },
    config::Config,
    metrics::{MetricsSnapshot, ToolMetrics},
    tools::{
        AddMemoryRequest, RetrieveMemoryRequest, ToolOutput,
        add::{add_failure, build_add_payload, interpret_add_response},
        placeholder::placeholder_output,
        retrieve::{build_search_payload, interpret_search_response, search_failure},
    },
};

/// Settings the tool service needs; derived from [`Config`] in the binaries.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    /// Raw base URL configuration (single URL, comma-separated list, or `auto`).
    pub base_url: String,
    /// Retry policy for `POST /memories/async`.
    pub add_policy: RetryPolicy,
    /// Retry policy for `POST /search`.
    pub search_policy: RetryPolicy,
    /// Lifetime of a cached resolution.
    pub resolve_ttl: Duration,
    /// Timeout of one health probe.
    pub probe_timeout: Duration,
}

impl ServiceSettings {
    /// Default settings for the given base URL configuration.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            add_policy: RetryPolicy::add_memory(),
            search_policy: RetryPolicy::search(),
            resolve_ttl: DEFAULT_RESOLVE_TTL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    /// Settings taken from the loaded environment configuration.
    pub fn from_config(config: &Config) -> Self {
        let backoff_base = Duration::from_millis(config.backoff_base_ms);
        Self {
            base_url: config.base_url.clone(),
            add_policy: RetryPolicy {
                max_retries: config.max_retries,
                timeout: Duration::from_millis(config.add_timeout_ms),
                backoff_base,
            },
            search_policy: RetryPolicy {
                max_retries: config.max_retries,
                timeout: Duration::from_millis(config.search_timeout_ms),
                backoff_base,
            },
            resolve_ttl: Duration::from_secs(config.resolve_ttl_secs),
            probe_timeout: Duration::from_millis(config.probe_timeout_ms),
        }
    }
}

/// Resolution state reported by the health surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceHealth {
    /// Raw base URL configuration.
    pub configured: String,
    /// Base URL currently selected by the resolver.
    pub resolved: String,
    /// Cache state after resolving.
    pub cache: ResolutionSnapshot,
}

/// Operations shared by the HTTP and MCP surfaces.
#[async_trait]
pub trait ToolApi: Send + Sync {
    /// Queue a memory for ingestion.
    async fn add_memory(&self, request: AddMemoryRequest) -> ToolOutput;

    /// Search stored memories.
    async fn retrieve_memory(&self, request: RetrieveMemoryRequest) -> ToolOutput;

    /// Usage hint pointing at the concrete tools.
    fn placeholder(&self) -> ToolOutput {
        placeholder_output()
    }

    /// Check that a base URL points at a live memory service.
    async fn validate_credentials(&self, base_url: &str) -> Result<(), CredentialValidationError>;

    /// Current counters.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

/// Owns the HTTP client, the base URL resolver, and the metrics registry.
///
/// Construct the service once near process start and share it through an `Arc`; the resolver
/// cache lives here rather than in process-global state.
pub struct MemoryToolService {
    client: MemoryServiceClient,
    resolver: BaseUrlResolver,
    settings: ServiceSettings,
    metrics: Arc<ToolMetrics>,
}

impl MemoryToolService {
    /// Build a service with a fresh HTTP client.
    pub fn new(settings: ServiceSettings) -> Result<Self, MemoryServiceError> {
        Ok(Self::with_client(MemoryServiceClient::new()?, settings))
    }

    /// Build a service around an existing client.
    pub fn with_client(client: MemoryServiceClient, settings: ServiceSettings) -> Self {
        let resolver = BaseUrlResolver::with_settings(
            client.http().clone(),
            settings.resolve_ttl,
            settings.probe_timeout,
        );
        tracing::debug!(
            base_url = %settings.base_url,
            resolve_ttl_secs = settings.resolve_ttl.as_secs(),
            "Initialized memory tool service"
        );
        Self {
            client,
            resolver,
            settings,
            metrics: Arc::new(ToolMetrics::new()),
        }
    }

    /// Active settings.
    pub fn settings(&self) -> &ServiceSettings {
        &self.settings
    }

    /// Base URL resolver owned by this service.
    pub fn resolver(&self) -> &BaseUrlResolver {
        &self.resolver
    }

    /// Resolve the base URL (respecting the cache) and report the cache state.
    pub async fn health(&self) -> ServiceHealth {
        let resolved = self.resolver.resolve(&self.settings.base_url).await;
        ServiceHealth {
            configured: self.settings.base_url.clone(),
            resolved,
            cache: self.resolver.snapshot(),
        }
    }

    async fn endpoint(&self, path: &str) -> Result<String, RequestFailure> {
        let base = self.resolver.resolve(&self.settings.base_url).await;
        if base.is_empty() {
            return Err(RequestFailure {
                url: path.to_string(),
                error: MemoryServiceError::Configuration("base_url is required".into()),
                attempts: 0,
                backoffs: 0,
            });
        }
        Ok(format_endpoint(&base, path))
    }

    fn record(&self, failure: Option<&RequestFailure>, backoffs: u32) {
        self.metrics.record_retries(u64::from(backoffs));
        if failure.is_some() {
            self.metrics.record_failure();
        }
    }
}

#[async_trait]
impl ToolApi for MemoryToolService {
    async fn add_memory(&self, request: AddMemoryRequest) -> ToolOutput {
        self.metrics.record_add();
        let url = match self.endpoint("/memories/async").await {
            Ok(url) => url,
            Err(failure) => {
                self.record(Some(&failure), 0);
                return add_failure(&failure);
            }
        };

        let payload = build_add_payload(&request);
        match self
            .client
            .post_with_retry(&url, &payload, &self.settings.add_policy)
            .await
        {
            Ok(response) => {
                self.record(None, response.backoffs);
                tracing::info!(url = %url, status = response.status.as_u16(), attempts = response.attempts, "Add memory request completed");
                interpret_add_response(&url, &request, &response)
            }
            Err(failure) => {
                self.record(Some(&failure), failure.backoffs);
                add_failure(&failure)
            }
        }
    }

    async fn retrieve_memory(&self, request: RetrieveMemoryRequest) -> ToolOutput {
        self.metrics.record_retrieve();
        let url = match self.endpoint("/search").await {
            Ok(url) => url,
            Err(failure) => {
                self.record(Some(&failure), 0);
                return search_failure(&failure);
            }
        };

        let payload = build_search_payload(&request);
        match self
            .client
            .post_with_retry(&url, &payload, &self.settings.search_policy)
            .await
        {
            Ok(response) => {
                self.record(None, response.backoffs);
                tracing::info!(url = %url, status = response.status.as_u16(), attempts = response.attempts, "Search request completed");
                interpret_search_response(&url, &request, &response)
            }
            Err(failure) => {
                self.record(Some(&failure), failure.backoffs);
                search_failure(&failure)
            }
        }
    }

    async fn validate_credentials(&self, base_url: &str) -> Result<(), CredentialValidationError> {
        self.client.validate_credentials(base_url).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
