//! `mem_dm_add_memory`: queue a memory for background ingestion.

use reqwest::StatusCode;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{ToolOutput, is_truthy, non_empty};
use crate::client::{HttpSuccess, RequestFailure};

/// Arguments accepted by the add-memory tool.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct AddMemoryRequest {
    /// Text to remember.
    pub content: String,
    /// Owner of the memory.
    pub user_id: String,
    /// Optional agent identifier.
    #[serde(default)]
    pub agent_id: Option<String>,
    /// Optional run identifier.
    #[serde(default)]
    pub run_id: Option<String>,
    /// Optional JSON-encoded metadata object.
    #[serde(default)]
    pub metadata: Option<String>,
}

/// Number of characters of `content` echoed back in the accepted summary.
const CONTENT_PREVIEW_CHARS: usize = 80;

/// Build the `POST /memories/async` payload.
pub fn build_add_payload(request: &AddMemoryRequest) -> Value {
    let mut payload = Map::new();
    payload.insert(
        "messages".into(),
        json!([{ "role": "user", "content": request.content }]),
    );
    payload.insert("user_id".into(), Value::String(request.user_id.clone()));
    if let Some(agent_id) = non_empty(&request.agent_id) {
        payload.insert("agent_id".into(), Value::String(agent_id.into()));
    }
    if let Some(run_id) = non_empty(&request.run_id) {
        payload.insert("run_id".into(), Value::String(run_id.into()));
    }
    // Metadata that does not parse is dropped; the memory is still stored.
    if let Some(metadata) = non_empty(&request.metadata).and_then(parse_metadata) {
        payload.insert("metadata".into(), metadata);
    }
    Value::Object(payload)
}

/// Parse the JSON-encoded metadata argument, returning `None` on malformed input.
pub fn parse_metadata(raw: &str) -> Option<Value> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::debug!(%error, "Ignoring metadata that is not valid JSON");
            None
        }
    }
}

/// Interpret a successful ingestion response.
///
/// A truthy `accepted` field or a 202 status means the service queued the memory; anything else
/// is treated as a synchronous success.
pub fn interpret_add_response(
    url: &str,
    request: &AddMemoryRequest,
    response: &HttpSuccess,
) -> ToolOutput {
    let body = &response.body;
    let accepted = body.get("accepted").is_some_and(is_truthy)
        || response.status == StatusCode::ACCEPTED;

    if accepted {
        let preview: String = request.content.chars().take(CONTENT_PREVIEW_CHARS).collect();
        return ToolOutput::success(
            json!({
                "status": "accepted",
                "accepted": true,
                "echo": { "user_id": request.user_id },
            }),
            format!("Accepted for background processing\nEndpoint: {url}\nContent: {preview}\n"),
        );
    }

    let results = body.get("results").cloned().unwrap_or_else(|| body.clone());
    ToolOutput::success(
        json!({ "status": "success", "results": results }),
        format!("Succeeded: {url}"),
    )
}

/// Render a terminal request failure.
pub fn add_failure(failure: &RequestFailure) -> ToolOutput {
    ToolOutput::failure(format!("ADD request failed | {failure}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryServiceError;

    fn request() -> AddMemoryRequest {
        AddMemoryRequest {
            content: "Prefers tea over coffee".into(),
            user_id: "u-1".into(),
            ..Default::default()
        }
    }

    fn success(status: StatusCode, body: Value) -> HttpSuccess {
        HttpSuccess {
            status,
            body,
            attempts: 1,
            backoffs: 0,
        }
    }

    #[test]
    fn payload_contains_required_fields_only_by_default() {
        let payload = build_add_payload(&request());
        assert_eq!(
            payload,
            json!({
                "messages": [{ "role": "user", "content": "Prefers tea over coffee" }],
                "user_id": "u-1",
            })
        );
    }

    #[test]
    fn optional_fields_are_forwarded_when_present() {
        let payload = build_add_payload(&AddMemoryRequest {
            agent_id: Some("agent-7".into()),
            run_id: Some(String::new()),
            metadata: Some(r#"{"source":"chat","turn":3}"#.into()),
            ..request()
        });
        assert_eq!(payload["agent_id"], "agent-7");
        assert!(payload.get("run_id").is_none());
        assert_eq!(payload["metadata"], json!({"source": "chat", "turn": 3}));
    }

    #[test]
    fn malformed_metadata_is_ignored() {
        let payload = build_add_payload(&AddMemoryRequest {
            metadata: Some("{not json".into()),
            ..request()
        });
        assert!(payload.get("metadata").is_none());
        assert_eq!(parse_metadata("{not json"), None);
    }

    #[test]
    fn accepted_flag_yields_accepted_status() {
        let output = interpret_add_response(
            "http://svc/memories/async",
            &request(),
            &success(StatusCode::OK, json!({ "accepted": true, "job_id": "j1" })),
        );
        assert!(!output.is_error);
        assert_eq!(
            output.json,
            Some(json!({ "status": "accepted", "accepted": true, "echo": { "user_id": "u-1" } }))
        );
        assert_eq!(
            output.text,
            "Accepted for background processing\nEndpoint: http://svc/memories/async\nContent: Prefers tea over coffee\n"
        );
    }

    #[test]
    fn status_202_counts_as_accepted() {
        let output = interpret_add_response(
            "http://svc/memories/async",
            &request(),
            &success(StatusCode::ACCEPTED, json!({ "raw": "" })),
        );
        assert_eq!(output.json.as_ref().map(|json| &json["status"]), Some(&json!("accepted")));
    }

    #[test]
    fn accepted_summary_truncates_content() {
        let long = AddMemoryRequest {
            content: "é".repeat(120),
            ..request()
        };
        let output = interpret_add_response(
            "u",
            &long,
            &success(StatusCode::ACCEPTED, json!({})),
        );
        let preview = output
            .text
            .lines()
            .find_map(|line| line.strip_prefix("Content: "))
            .expect("content line");
        assert_eq!(preview.chars().count(), 80);
    }

    #[test]
    fn synchronous_success_uses_results_field() {
        let output = interpret_add_response(
            "http://svc/memories/async",
            &request(),
            &success(
                StatusCode::OK,
                json!({ "accepted": false, "results": [{ "id": "m1", "event": "ADD" }] }),
            ),
        );
        assert_eq!(
            output.json,
            Some(json!({ "status": "success", "results": [{ "id": "m1", "event": "ADD" }] }))
        );
        assert_eq!(output.text, "Succeeded: http://svc/memories/async");
    }

    #[test]
    fn synchronous_success_without_results_echoes_body() {
        let body = json!({ "message": "ok" });
        let output = interpret_add_response("u", &request(), &success(StatusCode::OK, body.clone()));
        assert_eq!(output.json, Some(json!({ "status": "success", "results": body })));
    }

    #[test]
    fn failures_name_the_endpoint() {
        let output = add_failure(&RequestFailure {
            url: "http://svc/memories/async".into(),
            error: MemoryServiceError::ClientStatus {
                status: 422,
                detail: "user_id required".into(),
            },
            attempts: 1,
            backoffs: 0,
        });
        assert!(output.is_error);
        assert_eq!(
            output.text,
            "ADD request failed | url=http://svc/memories/async | error=HTTP 422 | detail=user_id required"
        );
    }
}
