use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub crew: CrewConfig,
    #[serde(default)]
    pub mcp: McpConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default = "default_agents")]
    pub agents: Vec<AgentConfig>,
    #[serde(default = "default_tasks")]
    pub tasks: Vec<TaskConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            crew: CrewConfig::default(),
            mcp: McpConfig::default(),
            observability: ObservabilityConfig::default(),
            agents: default_agents(),
            tasks: default_tasks(),
        }
    }
}

/// Crew process selector. Only sequential execution is supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessKind {
    #[default]
    Sequential,
}

impl std::fmt::Display for ProcessKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequential"),
        }
    }
}

fn default_crew_name() -> String {
    "ai-agents".into()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrewConfig {
    #[serde(default = "default_crew_name")]
    pub name: String,
    #[serde(default)]
    pub process: ProcessKind,
    #[serde(default = "default_true")]
    pub verbose: bool,
}

impl Default for CrewConfig {
    fn default() -> Self {
        Self {
            name: default_crew_name(),
            process: ProcessKind::Sequential,
            verbose: true,
        }
    }
}

fn default_mcp_id() -> String {
    "jira".into()
}

pub(crate) fn default_mcp_timeout() -> u64 {
    60
}

pub(crate) const DEFAULT_MCP_URL: &str = "http://localhost:9000/mcp";

#[derive(Clone, Deserialize, Serialize)]
pub struct McpConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_mcp_id")]
    pub id: String,
    /// HTTP transport: streamable MCP endpoint.
    #[serde(default)]
    pub url: Option<String>,
    /// Stdio transport: command to spawn.
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Connect timeout in seconds.
    #[serde(default = "default_mcp_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub allowed_commands: Vec<String>,
    #[serde(default)]
    pub block_private_hosts: bool,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            id: default_mcp_id(),
            url: Some(DEFAULT_MCP_URL.into()),
            command: None,
            args: Vec::new(),
            env: HashMap::new(),
            timeout: default_mcp_timeout(),
            allowed_commands: Vec::new(),
            block_private_hosts: false,
        }
    }
}

impl std::fmt::Debug for McpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted: HashMap<&str, &str> = self
            .env
            .keys()
            .map(|k| (k.as_str(), "[REDACTED]"))
            .collect();
        f.debug_struct("McpConfig")
            .field("enabled", &self.enabled)
            .field("id", &self.id)
            .field("url", &self.url)
            .field("command", &self.command)
            .field("args", &self.args)
            .field("env", &redacted)
            .field("timeout", &self.timeout)
            .field("allowed_commands", &self.allowed_commands)
            .field("block_private_hosts", &self.block_private_hosts)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AgentConfig {
    pub id: String,
    pub role: String,
    pub goal: String,
    #[serde(default)]
    pub backstory: String,
}

/// Shape a task's result must take.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Text,
    /// JSON matching `TaskList`.
    TaskList,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TaskConfig {
    pub id: String,
    pub agent: String,
    pub description: String,
    #[serde(default)]
    pub expected_output: String,
    /// Bind the MCP tool snapshot to this task.
    #[serde(default)]
    pub use_mcp_tools: bool,
    /// Restrict the bound MCP tools to these names. Empty binds all of them.
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub output: OutputFormat,
    /// Earlier tasks whose outputs are passed to this one.
    #[serde(default)]
    pub context: Vec<String>,
}

fn agent(id: &str, role: &str, goal: &str, backstory: &str) -> AgentConfig {
    AgentConfig {
        id: id.into(),
        role: role.into(),
        goal: goal.into(),
        backstory: backstory.into(),
    }
}

fn default_agents() -> Vec<AgentConfig> {
    vec![
        agent(
            "project_manager",
            "Project Manager",
            "Turn the project brief into a delivery plan and keep the JIRA board in sync with it",
            "A delivery lead who has run many software projects and writes tickets engineers can pick up without asking questions.",
        ),
        agent(
            "system_analyst",
            "System Analyst",
            "Elicit and formalize the requirements of {project_description}",
            "An analyst who turns vague business needs into precise functional and non-functional requirements.",
        ),
        agent(
            "architect",
            "Software Architect",
            "Design a system that satisfies the specified requirements",
            "An architect who favors simple, well-bounded components and documents the trade-offs behind them.",
        ),
        agent(
            "fullstack_engineer",
            "Full-Stack Engineer",
            "Implement the planned tasks following the system design",
            "An engineer comfortable across frontend, backend, and infrastructure code.",
        ),
    ]
}

fn task(
    id: &str,
    agent: &str,
    description: &str,
    expected_output: &str,
    context: &[&str],
) -> TaskConfig {
    TaskConfig {
        id: id.into(),
        agent: agent.into(),
        description: description.into(),
        expected_output: expected_output.into(),
        use_mcp_tools: false,
        tools: Vec::new(),
        output: OutputFormat::Text,
        context: context.iter().map(|&s| s.to_owned()).collect(),
    }
}

fn default_tasks() -> Vec<TaskConfig> {
    vec![
        task(
            "requirements_analysis",
            "system_analyst",
            "Analyze the project brief: {project_description}. Identify stakeholders, goals, constraints, and open questions.",
            "A structured analysis of stakeholders, goals, constraints, and open questions.",
            &[],
        ),
        task(
            "requirements_specification",
            "system_analyst",
            "Write a requirements specification from the analysis, covering functional and non-functional requirements.",
            "A numbered requirements specification.",
            &["requirements_analysis"],
        ),
        task(
            "system_design",
            "architect",
            "Design the system architecture that satisfies the requirements specification.",
            "An architecture document with components, interfaces, and data flow.",
            &["requirements_specification"],
        ),
        TaskConfig {
            output: OutputFormat::TaskList,
            ..task(
                "project_task_planning",
                "project_manager",
                "Break the system design into implementation tasks for JIRA project {project_key}.",
                "A JSON object {\"tasks\": [...]} where each task has project_key, summary, issue_type, description, and priority.",
                &["requirements_specification", "system_design"],
            )
        },
        TaskConfig {
            use_mcp_tools: true,
            ..task(
                "jira_task_creation",
                "project_manager",
                "Create a JIRA issue in project {project_key} for every planned task using the available tools.",
                "The list of created issue keys with their summaries.",
                &["project_task_planning"],
            )
        },
        task(
            "write_code",
            "fullstack_engineer",
            "Implement the planned tasks following the system design.",
            "Source code for the planned tasks with a short explanation of each change.",
            &["system_design", "project_task_planning"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_serialize_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let back: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(back.crew.name, config.crew.name);
        assert_eq!(back.mcp.url, config.mcp.url);
        assert_eq!(back.mcp.timeout, config.mcp.timeout);
        assert_eq!(back.agents, config.agents);
        assert_eq!(back.tasks, config.tasks);
    }

    #[test]
    fn default_roster_order() {
        let ids: Vec<_> = default_tasks().into_iter().map(|t| t.id).collect();
        assert_eq!(
            ids,
            vec![
                "requirements_analysis",
                "requirements_specification",
                "system_design",
                "project_task_planning",
                "jira_task_creation",
                "write_code",
            ]
        );
    }

    #[test]
    fn only_jira_task_uses_mcp_tools() {
        let with_tools: Vec<_> = default_tasks()
            .into_iter()
            .filter(|t| t.use_mcp_tools)
            .map(|t| t.id)
            .collect();
        assert_eq!(with_tools, vec!["jira_task_creation"]);
    }

    #[test]
    fn planning_task_emits_task_list() {
        let planning = default_tasks()
            .into_iter()
            .find(|t| t.id == "project_task_planning")
            .unwrap();
        assert_eq!(planning.output, OutputFormat::TaskList);
    }

    #[test]
    fn mcp_debug_redacts_env() {
        let mcp = McpConfig {
            env: HashMap::from([("JIRA_TOKEN".into(), "secret".into())]),
            ..McpConfig::default()
        };
        let debug = format!("{mcp:?}");
        assert!(debug.contains("JIRA_TOKEN"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret\""));
    }
}
