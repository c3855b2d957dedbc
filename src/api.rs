//! HTTP surface for the mem-dm tools.
//!
//! This module exposes a compact Axum router for hosts that invoke tools over HTTP:
//!
//! - `POST /tools/mem_dm_add_memory` – Queue a memory for background ingestion.
//! - `POST /tools/mem_dm_retrieve_memory` – Search memories and return trimmed records.
//! - `POST /tools/mem_dm` – Usage hint.
//! - `POST /credentials/validate` – Check that a base URL points at a live memory service.
//! - `GET /metrics` – Observe invocation, retry, and failure counters.
//! - `GET /tools` – Machine-readable tool catalog for quick discovery by hosts.
//!
//! Tool routes answer `200` even when the memory service fails; the failure travels in the
//! message list with `is_error: true`, exactly as the MCP surface reports it.

use crate::client::CredentialValidationError;
use crate::metrics::MetricsSnapshot;
use crate::service::ToolApi;
use crate::tools::{
    ADD_MEMORY_TOOL, AddMemoryRequest, PLACEHOLDER_TOOL, RETRIEVE_MEMORY_TOOL,
    RetrieveMemoryRequest, ToolMessage, ToolOutput,
};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the tool surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: ToolApi + 'static,
{
    Router::new()
        .route(
            &format!("/tools/{ADD_MEMORY_TOOL}"),
            post(add_memory::<S>),
        )
        .route(
            &format!("/tools/{RETRIEVE_MEMORY_TOOL}"),
            post(retrieve_memory::<S>),
        )
        .route(
            &format!("/tools/{PLACEHOLDER_TOOL}"),
            post(placeholder::<S>),
        )
        .route("/tools", get(get_tools))
        .route("/credentials/validate", post(validate_credentials::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .with_state(service)
}

/// Response body shared by every tool route.
#[derive(Serialize)]
struct ToolResponse {
    /// Structured message first (when present), then the text message.
    messages: Vec<ToolMessage>,
    /// Whether the invocation ended in an error payload.
    is_error: bool,
}

impl From<ToolOutput> for ToolResponse {
    fn from(output: ToolOutput) -> Self {
        Self {
            messages: output.messages(),
            is_error: output.is_error,
        }
    }
}

async fn add_memory<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<AddMemoryRequest>,
) -> Json<ToolResponse>
where
    S: ToolApi,
{
    Json(service.add_memory(request).await.into())
}

async fn retrieve_memory<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<RetrieveMemoryRequest>,
) -> Json<ToolResponse>
where
    S: ToolApi,
{
    Json(service.retrieve_memory(request).await.into())
}

async fn placeholder<S>(State(service): State<Arc<S>>) -> Json<ToolResponse>
where
    S: ToolApi,
{
    Json(service.placeholder().into())
}

/// Request body for `POST /credentials/validate`.
#[derive(Deserialize)]
struct ValidateRequest {
    /// Base URL to check.
    #[serde(default)]
    base_url: String,
}

/// Validate a base URL, answering `400` with the validation message on failure.
async fn validate_credentials<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<ValidateRequest>,
) -> Result<Json<serde_json::Value>, AppError>
where
    S: ToolApi,
{
    service.validate_credentials(&request.base_url).await?;
    Ok(Json(json!({ "status": "ok" })))
}

/// Return the invocation counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: ToolApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single tool in the discovery catalog.
#[derive(Serialize)]
struct ToolDescriptor {
    name: &'static str,
    method: &'static str,
    path: String,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /tools`.
#[derive(Serialize)]
struct ToolsResponse {
    tools: Vec<ToolDescriptor>,
}

/// Enumerate supported tools for discovery in hosts.
async fn get_tools() -> Json<ToolsResponse> {
    Json(ToolsResponse {
        tools: vec![
            ToolDescriptor {
                name: ADD_MEMORY_TOOL,
                method: "POST",
                path: format!("/tools/{ADD_MEMORY_TOOL}"),
                description: "Queue content for background ingestion. The JSON message reports { \"status\": \"accepted\" } or { \"status\": \"success\", \"results\": ... }.",
                request_example: Some(json!({
                    "content": "I prefer window seats",
                    "user_id": "alice",
                    "agent_id": "travel-agent",
                    "run_id": "session-42",
                    "metadata": "{\"source\": \"chat\"}"
                })),
            },
            ToolDescriptor {
                name: RETRIEVE_MEMORY_TOOL,
                method: "POST",
                path: format!("/tools/{RETRIEVE_MEMORY_TOOL}"),
                description: "Search memories. The JSON message carries { \"results\": [...], \"relations\": [...] } with records trimmed to memory, score, timestamps, metadata, and user_id.",
                request_example: Some(json!({
                    "query": "seat preference",
                    "user_id": "alice",
                    "limit": 5,
                    "threshold": 0.3
                })),
            },
            ToolDescriptor {
                name: PLACEHOLDER_TOOL,
                method: "POST",
                path: format!("/tools/{PLACEHOLDER_TOOL}"),
                description: "Usage hint naming the concrete tools.",
                request_example: None,
            },
        ],
    })
}

struct AppError(CredentialValidationError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

impl From<CredentialValidationError> for AppError {
    fn from(inner: CredentialValidationError) -> Self {
        Self(inner)
    }
}
