//! Tool implementations: request shaping and response interpretation.
//!
//! Each tool builds a JSON payload from its arguments, hands it to the retrying client, and
//! turns the outcome into a [`ToolOutput`]. Network access lives in [`crate::service`]; the
//! functions here are pure so they can be tested without a server.

pub mod add;
pub mod output;
pub mod placeholder;
pub mod retrieve;

use serde_json::Value;

pub use add::AddMemoryRequest;
pub use output::{ToolMessage, ToolOutput};
pub use retrieve::RetrieveMemoryRequest;

/// Tool name of the add-memory tool.
pub const ADD_MEMORY_TOOL: &str = "mem_dm_add_memory";
/// Tool name of the retrieve-memory tool.
pub const RETRIEVE_MEMORY_TOOL: &str = "mem_dm_retrieve_memory";
/// Tool name of the placeholder tool.
pub const PLACEHOLDER_TOOL: &str = "mem_dm";

/// JSON truthiness: `null`, `false`, `0`, and empty strings, arrays, or objects are falsy.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Optional string arguments are only forwarded when non-empty.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|text| !text.is_empty())
}
