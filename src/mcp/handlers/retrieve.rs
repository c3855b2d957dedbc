//! MCP handler for the retrieve-memory tool.

use std::sync::Arc;

use crate::{
    mcp::format::tool_result,
    service::{MemoryToolService, ToolApi},
    tools::RetrieveMemoryRequest,
};
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, JsonObject},
};

use super::parse_arguments;

/// Handle `mem_dm_retrieve_memory` by querying the search endpoint.
pub(crate) async fn handle_retrieve_memory(
    service: &Arc<MemoryToolService>,
    arguments: Option<JsonObject>,
) -> Result<CallToolResult, McpError> {
    let request: RetrieveMemoryRequest = parse_arguments(arguments)?;
    Ok(tool_result(service.retrieve_memory(request).await))
}
