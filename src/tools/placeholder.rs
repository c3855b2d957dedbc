//! `mem_dm`: points callers at the concrete tools.

use super::{ADD_MEMORY_TOOL, RETRIEVE_MEMORY_TOOL, ToolOutput};

/// Emit the usage hint.
pub fn placeholder_output() -> ToolOutput {
    ToolOutput::text_only(format!(
        "Use {ADD_MEMORY_TOOL} or {RETRIEVE_MEMORY_TOOL} tools."
    ))
}
