use ensemble_mcp::McpTool;

use crate::config::TaskConfig;

/// Select the MCP tools a task receives from the adapter's current snapshot.
///
/// Tasks that do not opt in get nothing. An opted-in task facing an empty
/// snapshot proceeds without tools; this is logged, not treated as an error.
#[must_use]
pub fn bind_tools(task: &TaskConfig, snapshot: &[McpTool]) -> Vec<McpTool> {
    if !task.use_mcp_tools {
        return Vec::new();
    }
    if snapshot.is_empty() {
        tracing::warn!(
            task = task.id,
            "MCP tools unavailable, {} may be limited",
            task.id
        );
        return Vec::new();
    }
    if task.tools.is_empty() {
        return snapshot.to_vec();
    }

    for wanted in &task.tools {
        if !snapshot.iter().any(|t| &t.name == wanted) {
            tracing::warn!(task = task.id, tool = wanted, "requested MCP tool not advertised");
        }
    }
    snapshot
        .iter()
        .filter(|t| task.tools.contains(&t.name))
        .cloned()
        .collect()
}
