//! Formatting helpers shared across MCP handlers and resources.

use crate::{
    client::RetryPolicy,
    service::{ServiceHealth, ServiceSettings},
    tools::ToolOutput,
};
use rmcp::model::{CallToolResult, Content, ResourceContents};
use serde::Serialize;
use serde_json::{Value, json};

pub(crate) const APPLICATION_JSON: &str = "application/json";

/// Convert a tool output into an MCP result.
///
/// The structured message is attached as `structuredContent` and mirrored as JSON text so
/// clients without structured-output support still see it; the human-readable line follows.
pub(crate) fn tool_result(output: ToolOutput) -> CallToolResult {
    let ToolOutput {
        json,
        text,
        is_error,
    } = output;

    let mut contents = Vec::with_capacity(2);
    if let Some(json) = json.as_ref() {
        contents.push(Content::text(serialize_json(json, "tool-output")));
    }
    contents.push(Content::text(text));

    let mut result = if is_error {
        CallToolResult::error(contents)
    } else {
        CallToolResult::success(contents)
    };
    result.structured_content = json;
    result
}

/// Build the health payload describing base URL resolution and retry settings.
pub(crate) fn health_payload(health: &ServiceHealth, settings: &ServiceSettings) -> String {
    let payload = json!({
        "memoryService": {
            "configured": health.configured,
            "resolved": health.resolved,
            "cache": {
                "value": health.cache.value,
                "ageSecs": health.cache.age_secs,
                "fresh": health.cache.fresh,
                "ttlSecs": health.cache.ttl_secs,
            },
        },
        "retry": {
            "addMemory": policy_payload(&settings.add_policy),
            "search": policy_payload(&settings.search_policy),
        },
    });

    serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string())
}

fn policy_payload(policy: &RetryPolicy) -> Value {
    json!({
        "maxRetries": policy.max_retries,
        "timeoutMs": policy.timeout.as_millis() as u64,
        "backoffBaseMs": policy.backoff_base.as_millis() as u64,
    })
}

/// Serialize a value to JSON, falling back to compact formatting on error.
pub(crate) fn serialize_json<T: Serialize>(value: &T, context: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|error| {
        tracing::warn!(context, %error, "Failed to serialize JSON prettily");
        serde_json::to_string(value).unwrap_or_else(|_| "{}".into())
    })
}

/// Build JSON resource contents for MCP resource responses.
pub(crate) fn json_resource_contents(uri: &str, text: String) -> ResourceContents {
    ResourceContents::TextResourceContents {
        uri: uri.to_string(),
        mime_type: Some(APPLICATION_JSON.into()),
        text,
        meta: None,
    }
}
