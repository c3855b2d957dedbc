//! Messages emitted by a tool invocation.

use serde::Serialize;
use serde_json::{Value, json};

/// Result of one tool invocation: an optional structured message plus a text message.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Structured JSON message.
    pub json: Option<Value>,
    /// Human-readable message.
    pub text: String,
    /// Whether the invocation ended in an error payload.
    pub is_error: bool,
}

impl ToolOutput {
    /// Successful invocation with both messages.
    pub fn success(json: Value, text: impl Into<String>) -> Self {
        Self {
            json: Some(json),
            text: text.into(),
            is_error: false,
        }
    }

    /// Successful invocation carrying only text.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            json: None,
            text: text.into(),
            is_error: false,
        }
    }

    /// Failed invocation: `{status: "error", error}` plus the same message as text.
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            json: Some(json!({ "status": "error", "error": message })),
            text: message,
            is_error: true,
        }
    }

    /// Messages in emission order: structured first, then text.
    pub fn messages(&self) -> Vec<ToolMessage> {
        let mut messages = Vec::with_capacity(2);
        if let Some(json) = &self.json {
            messages.push(ToolMessage::Json(json.clone()));
        }
        messages.push(ToolMessage::Text(self.text.clone()));
        messages
    }
}

/// A single emitted message, serialized as `{ "type": ..., "message": ... }`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "message", rename_all = "lowercase")]
pub enum ToolMessage {
    /// Structured payload.
    Json(Value),
    /// Plain text.
    Text(String),
}
