//! `mem_dm_retrieve_memory`: semantic search over stored memories.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::{ToolOutput, is_truthy, non_empty};
use crate::client::{HttpSuccess, RequestFailure};

/// Fields kept on each result record.
pub const RESULT_FIELDS: [&str; 6] = [
    "memory",
    "created_at",
    "updated_at",
    "score",
    "metadata",
    "user_id",
];

/// Arguments accepted by the retrieve-memory tool.
#[derive(Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
pub struct RetrieveMemoryRequest {
    /// Natural language query.
    pub query: String,
    /// Owner whose memories are searched.
    pub user_id: String,
    /// Optional run identifier.
    #[serde(default)]
    pub run_id: Option<String>,
    /// Optional agent identifier.
    #[serde(default)]
    pub agent_id: Option<String>,
    /// Optional filters passed through to the memory service.
    #[serde(default)]
    pub filters: Option<Value>,
    /// Optional maximum number of results.
    #[serde(default)]
    pub limit: Option<u32>,
    /// Optional minimum similarity score.
    #[serde(default)]
    pub threshold: Option<f64>,
}

/// Build the `POST /search` payload.
pub fn build_search_payload(request: &RetrieveMemoryRequest) -> Value {
    let mut payload = Map::new();
    payload.insert("query".into(), Value::String(request.query.clone()));
    payload.insert("user_id".into(), Value::String(request.user_id.clone()));
    if let Some(run_id) = non_empty(&request.run_id) {
        payload.insert("run_id".into(), Value::String(run_id.into()));
    }
    if let Some(agent_id) = non_empty(&request.agent_id) {
        payload.insert("agent_id".into(), Value::String(agent_id.into()));
    }
    if let Some(filters) = request.filters.as_ref().filter(|filters| is_truthy(filters)) {
        payload.insert("filters".into(), filters.clone());
    }
    if let Some(limit) = request.limit {
        payload.insert("limit".into(), Value::from(limit));
    }
    if let Some(threshold) = request.threshold {
        payload.insert("threshold".into(), Value::from(threshold));
    }
    Value::Object(payload)
}

/// Keep only [`RESULT_FIELDS`]; a record with none of them is returned unchanged.
pub fn filter_record(record: Value) -> Value {
    match record {
        Value::Object(map) => {
            let filtered: Map<String, Value> = map
                .iter()
                .filter(|(key, _)| RESULT_FIELDS.contains(&key.as_str()))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            if filtered.is_empty() {
                Value::Object(map)
            } else {
                Value::Object(filtered)
            }
        }
        other => other,
    }
}

/// Split a search body into `(results, relations)`.
fn split_search_body(body: &Value) -> (Vec<Value>, Value) {
    match body {
        Value::Object(map) => {
            let results = match map.get("results") {
                Some(Value::Array(items)) => items.clone(),
                Some(Value::Null) | None => Vec::new(),
                // A scalar or object `results` is treated as a single record.
                Some(other) => vec![other.clone()],
            };
            let relations = map.get("relations").cloned().unwrap_or_else(|| json!([]));
            (results, relations)
        }
        Value::Array(items) => (items.clone(), json!([])),
        _ => (Vec::new(), json!([])),
    }
}

/// Interpret a successful search response.
pub fn interpret_search_response(
    url: &str,
    request: &RetrieveMemoryRequest,
    response: &HttpSuccess,
) -> ToolOutput {
    let (raw_results, relations) = split_search_body(&response.body);
    let results: Vec<Value> = raw_results.into_iter().map(filter_record).collect();

    let top = results
        .first()
        .and_then(|first| first.get("memory"))
        .filter(|memory| is_truthy(memory))
        .map(|memory| match memory {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default();

    ToolOutput::success(
        json!({ "results": results, "relations": relations }),
        format!("Endpoint: {url}\nQuery: {}\nTop: {top}", request.query),
    )
}

/// Render a terminal request failure.
pub fn search_failure(failure: &RequestFailure) -> ToolOutput {
    ToolOutput::failure(format!("SEARCH request failed | {failure}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    fn request() -> RetrieveMemoryRequest {
        RetrieveMemoryRequest {
            query: "drinks".into(),
            user_id: "u-1".into(),
            ..Default::default()
        }
    }

    fn success(body: Value) -> HttpSuccess {
        HttpSuccess {
            status: StatusCode::OK,
            body,
            attempts: 1,
            backoffs: 0,
        }
    }

    #[test]
    fn payload_includes_only_present_options() {
        assert_eq!(
            build_search_payload(&request()),
            json!({ "query": "drinks", "user_id": "u-1" })
        );

        let payload = build_search_payload(&RetrieveMemoryRequest {
            run_id: Some("r-1".into()),
            agent_id: Some(String::new()),
            filters: Some(json!({ "category": "prefs" })),
            limit: Some(0),
            threshold: Some(0.35),
            ..request()
        });
        assert_eq!(payload["run_id"], "r-1");
        assert!(payload.get("agent_id").is_none());
        assert_eq!(payload["filters"], json!({ "category": "prefs" }));
        assert_eq!(payload["limit"], 0);
        assert_eq!(payload["threshold"], 0.35);
    }

    #[test]
    fn empty_filters_are_not_sent() {
        let payload = build_search_payload(&RetrieveMemoryRequest {
            filters: Some(json!({})),
            ..request()
        });
        assert!(payload.get("filters").is_none());
    }

    #[test]
    fn records_are_trimmed_to_allowed_fields() {
        let record = json!({
            "id": "m1",
            "hash": "abc",
            "memory": "Prefers tea",
            "score": 0.91,
            "actor_id": null,
        });
        assert_eq!(
            filter_record(record),
            json!({ "memory": "Prefers tea", "score": 0.91 })
        );
    }

    #[test]
    fn records_without_allowed_fields_are_kept_verbatim() {
        let record = json!({ "id": "m1", "text": "legacy shape" });
        assert_eq!(filter_record(record.clone()), record);
        assert_eq!(filter_record(json!("plain")), json!("plain"));
    }

    #[test]
    fn object_bodies_yield_results_and_relations() {
        let output = interpret_search_response(
            "http://svc/search",
            &request(),
            &success(json!({
                "results": [
                    { "id": "m1", "memory": "Prefers tea", "score": 0.9 },
                    { "id": "m2", "memory": "Dislikes coffee", "score": 0.5 }
                ],
                "relations": [{ "source": "u-1", "relationship": "likes", "target": "tea" }]
            })),
        );

        assert_eq!(
            output.json,
            Some(json!({
                "results": [
                    { "memory": "Prefers tea", "score": 0.9 },
                    { "memory": "Dislikes coffee", "score": 0.5 }
                ],
                "relations": [{ "source": "u-1", "relationship": "likes", "target": "tea" }]
            }))
        );
        assert_eq!(
            output.text,
            "Endpoint: http://svc/search\nQuery: drinks\nTop: Prefers tea"
        );
    }

    #[test]
    fn list_bodies_have_no_relations() {
        let output = interpret_search_response(
            "u",
            &request(),
            &success(json!([{ "memory": "Prefers tea", "vector": [0.1] }])),
        );
        assert_eq!(
            output.json,
            Some(json!({ "results": [{ "memory": "Prefers tea" }], "relations": [] }))
        );
    }

    #[test]
    fn empty_or_unexpected_bodies_produce_blank_top() {
        let output = interpret_search_response("u", &request(), &success(json!({ "raw": "<html>" })));
        assert_eq!(output.json, Some(json!({ "results": [], "relations": [] })));
        assert!(output.text.ends_with("Top: "));

        let output = interpret_search_response("u", &request(), &success(json!("text")));
        assert_eq!(output.json, Some(json!({ "results": [], "relations": [] })));
    }

    #[test]
    fn single_record_results_are_wrapped() {
        let body = json!({ "results": { "memory": "Prefers tea", "hash": "h1" } });
        let output = interpret_search_response("u", &request(), &success(body));
        assert_eq!(
            output.json,
            Some(json!({ "results": [{ "memory": "Prefers tea" }], "relations": [] }))
        );
        assert!(output.text.ends_with("Top: Prefers tea"));
    }
}
