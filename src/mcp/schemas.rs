//! JSON schema builders for MCP tools.

use schemars::JsonSchema;
use serde_json::{Map, Value};

/// Derive the input schema of a tool from its argument type.
///
/// Field documentation becomes the property descriptions; `Option` fields are optional.
pub(crate) fn input_schema<T: JsonSchema>() -> Map<String, Value> {
    let root = schemars::schema_for!(T);
    match serde_json::to_value(root) {
        Ok(Value::Object(mut schema)) => {
            schema.remove("$schema");
            schema
        }
        Ok(_) | Err(_) => {
            tracing::warn!("Falling back to an empty input schema");
            empty_object_schema()
        }
    }
}

/// Schema for tools that take no arguments.
pub(crate) fn empty_object_schema() -> Map<String, Value> {
    let mut schema = Map::new();
    schema.insert("type".into(), Value::String("object".into()));
    schema.insert("properties".into(), Value::Object(Map::new()));
    schema
}
