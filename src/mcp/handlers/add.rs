//! MCP handler for the add-memory tool.

use std::sync::Arc;

use crate::{
    mcp::format::tool_result,
    service::{MemoryToolService, ToolApi},
    tools::AddMemoryRequest,
};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};

use super::parse_arguments;

/// Handle `mem_dm_add_memory` by forwarding the memory to the ingestion endpoint.
pub(crate) async fn handle_add_memory(
    service: &Arc<MemoryToolService>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let request: AddMemoryRequest = parse_arguments(arguments)?;
    Ok(tool_result(service.add_memory(request).await))
}
