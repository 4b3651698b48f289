use std::collections::HashMap;
use std::fmt::Write;

use ensemble_mcp::{McpTool, format_mcp_tools_prompt};

use crate::config::{AgentConfig, OutputFormat};

use super::output::TaskResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub id: String,
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

impl From<&AgentConfig> for Agent {
    fn from(cfg: &AgentConfig) -> Self {
        Self {
            id: cfg.id.clone(),
            role: cfg.role.clone(),
            goal: cfg.goal.clone(),
            backstory: cfg.backstory.clone(),
        }
    }
}

/// A task with its agent resolved and its tools bound.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    pub description: String,
    pub expected_output: String,
    pub agent: Agent,
    pub tools: Vec<McpTool>,
    pub output: OutputFormat,
    pub context: Vec<String>,
}

impl Task {
    /// Build the prompt handed to the runner for this task.
    #[must_use]
    pub fn render_prompt(&self, inputs: &HashMap<String, String>, context: &[&TaskResult]) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Role\n{}", interpolate(&self.agent.role, inputs));
        let _ = writeln!(out, "\n# Goal\n{}", interpolate(&self.agent.goal, inputs));
        if !self.agent.backstory.is_empty() {
            let _ = writeln!(
                out,
                "\n# Backstory\n{}",
                interpolate(&self.agent.backstory, inputs)
            );
        }
        let _ = writeln!(out, "\n# Task\n{}", interpolate(&self.description, inputs));
        if !self.expected_output.is_empty() {
            let _ = writeln!(
                out,
                "\n# Expected output\n{}",
                interpolate(&self.expected_output, inputs)
            );
        }
        if !context.is_empty() {
            out.push_str("\n# Context\n");
            for result in context {
                let _ = writeln!(out, "## {}\n{}", result.task_id, result.raw.trim_end());
            }
        }
        let tools = format_mcp_tools_prompt(&self.tools);
        if !tools.is_empty() {
            let _ = writeln!(out, "\n# Tools\n{tools}");
        }
        out
    }
}

/// Replace `{name}` placeholders with values from `inputs`.
///
/// Unknown placeholders and braces that do not enclose an identifier are kept
/// verbatim, so JSON examples in task text survive.
#[must_use]
pub fn interpolate(template: &str, inputs: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let name = &after[..name_len];

        if !name.is_empty()
            && after[name_len..].starts_with('}')
            && let Some(value) = inputs.get(name)
        {
            out.push_str(value);
            rest = &after[name_len + 1..];
        } else {
            out.push('{');
            rest = after;
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn inputs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn task(tools: Vec<McpTool>) -> Task {
        Task {
            id: "jira_task_creation".into(),
            description: "Create issues in {project_key}".into(),
            expected_output: "Issue keys".into(),
            agent: Agent {
                id: "project_manager".into(),
                role: "Project Manager".into(),
                goal: "Ship {project_key}".into(),
                backstory: String::new(),
            },
            tools,
            output: OutputFormat::Text,
            context: vec!["project_task_planning".into()],
        }
    }

    #[test]
    fn interpolate_replaces_known_inputs() {
        let out = interpolate(
            "Plan {project} for {team}",
            &inputs(&[("project", "billing"), ("team", "core")]),
        );
        assert_eq!(out, "Plan billing for core");
    }

    #[test]
    fn interpolate_keeps_unknown_placeholders() {
        let out = interpolate("Plan {project} by {deadline}", &inputs(&[("project", "x")]));
        assert_eq!(out, "Plan x by {deadline}");
    }

    #[test]
    fn interpolate_keeps_json_braces() {
        let template = r#"Return {"tasks": [...]} for {key}"#;
        let out = interpolate(template, &inputs(&[("key", "PM")]));
        assert_eq!(out, r#"Return {"tasks": [...]} for PM"#);
    }

    #[test]
    fn interpolate_handles_unclosed_and_empty_braces() {
        let empty = HashMap::new();
        assert_eq!(interpolate("{", &empty), "{");
        assert_eq!(interpolate("{}", &empty), "{}");
        assert_eq!(interpolate("a {b", &inputs(&[("b", "x")])), "a {b");
    }

    #[test]
    fn interpolate_does_not_recurse_into_values() {
        let out = interpolate("{a}", &inputs(&[("a", "{b}"), ("b", "nope")]));
        assert_eq!(out, "{b}");
    }

    #[test]
    fn prompt_includes_sections_and_context() {
        let planning = TaskResult {
            task_id: "project_task_planning".into(),
            agent_id: "project_manager".into(),
            raw: "three tasks\n".into(),
            task_list: None,
        };
        let prompt = task(Vec::new()).render_prompt(&inputs(&[("project_key", "PM")]), &[&planning]);
        assert!(prompt.contains("# Role\nProject Manager"));
        assert!(prompt.contains("# Goal\nShip PM"));
        assert!(!prompt.contains("# Backstory"));
        assert!(prompt.contains("# Task\nCreate issues in PM"));
        assert!(prompt.contains("# Expected output\nIssue keys"));
        assert!(prompt.contains("## project_task_planning\nthree tasks"));
        assert!(!prompt.contains("# Tools"));
    }

    #[test]
    fn prompt_lists_bound_tools() {
        let tool = McpTool {
            server_id: "jira".into(),
            name: "create_ticket".into(),
            description: "Create an issue".into(),
            input_schema: serde_json::json!({"type": "object"}),
        };
        let prompt = task(vec![tool]).render_prompt(&HashMap::new(), &[]);
        assert!(prompt.contains("# Tools\n<available_tools>"));
        assert!(prompt.contains("name=\"create_ticket\""));
    }

    proptest! {
        #[test]
        fn interpolate_without_inputs_is_identity(template in ".*") {
            prop_assert_eq!(interpolate(&template, &HashMap::new()), template);
        }

        #[test]
        fn interpolate_never_leaves_known_placeholder(value in "[a-z ]{0,16}") {
            let map = inputs(&[("key", value.as_str())]);
            let out = interpolate("x {key} y {key}", &map);
            prop_assert_eq!(out, format!("x {value} y {value}"));
        }
    }
}
