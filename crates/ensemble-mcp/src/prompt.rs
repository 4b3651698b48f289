use std::borrow::Cow;

use crate::tool::McpTool;

/// Render the tools bound to a task as an XML block for the executing agent.
///
/// Returns an empty string for an empty slice so callers can skip the section.
#[must_use]
pub fn format_mcp_tools_prompt(tools: &[McpTool]) -> String {
    if tools.is_empty() {
        return String::new();
    }
    let body: Vec<String> = tools.iter().map(render_tool).collect();
    format!("<available_tools>\n{}\n</available_tools>", body.join("\n"))
}

fn render_tool(tool: &McpTool) -> String {
    let mut lines = vec![format!(
        "  <tool server=\"{}\" name=\"{}\">",
        escape(&tool.server_id),
        escape(&tool.name)
    )];
    if !tool.description.is_empty() {
        lines.push(format!(
            "    <description>{}</description>",
            escape(&tool.description)
        ));
    }
    lines.push(format!(
        "    <parameters>{}</parameters>",
        escape(&tool.input_schema.to_string())
    ));
    lines.push("  </tool>".into());
    lines.join("\n")
}

fn escape(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>', '"']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
