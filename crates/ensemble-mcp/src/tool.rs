use serde::{Deserialize, Serialize};

/// A tool advertised by the connected MCP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpTool {
    pub server_id: String,
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Tool names in server-reported order.
#[must_use]
pub fn tool_names(tools: &[McpTool]) -> Vec<&str> {
    tools.iter().map(|t| t.name.as_str()).collect()
}

/// Text produced by a single `tools/call`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallOutput {
    pub text: String,
    /// Set when the server reported the call itself as failed.
    pub is_error: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_tool(server: &str, name: &str) -> McpTool {
        McpTool {
            server_id: server.into(),
            name: name.into(),
            description: "test tool".into(),
            input_schema: serde_json::json!({}),
        }
    }

    #[test]
    fn tool_names_preserve_order() {
        let tools = vec![make_tool("jira", "search"), make_tool("jira", "create_ticket")];
        assert_eq!(tool_names(&tools), vec!["search", "create_ticket"]);
    }

    #[test]
    fn tool_names_empty() {
        assert!(tool_names(&[]).is_empty());
    }

    #[test]
    fn tool_deserializes_from_json() {
        let json = r#"{"server_id":"fs","name":"read_file","description":"Read","input_schema":{"type":"object"}}"#;
        let parsed: McpTool = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.server_id, "fs");
        assert_eq!(parsed.name, "read_file");
        assert_eq!(parsed.input_schema["type"], "object");
    }

    #[test]
    fn call_output_default_is_not_error() {
        let out = ToolCallOutput::default();
        assert!(out.text.is_empty());
        assert!(!out.is_error);
    }
}
