//! Handler for the placeholder tool.

use std::sync::Arc;

use crate::{
    mcp::format::tool_result,
    service::{MemoryToolService, ToolApi},
};
use rmcp::{ErrorData as McpError, model::CallToolResult};

/// Handle `mem_dm`, which only points at the concrete tools.
pub(crate) async fn handle_placeholder(
    service: &Arc<MemoryToolService>,
) -> Result<CallToolResult, McpError> {
    Ok(tool_result(service.placeholder()))
}
