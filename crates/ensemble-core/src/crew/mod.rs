pub mod binding;
pub mod output;
pub mod process;
pub mod task;

pub use binding::bind_tools;
pub use output::{CrewOutput, TaskList, TaskOutput, TaskResult, extract_task_list};
pub use process::{TaskRequest, TaskRunner};
pub use task::{Agent, Task, interpolate};

use std::fmt::Write;

use ensemble_mcp::McpTool;

use crate::config::{Config, ConfigError, OutputFormat, ProcessKind};

#[derive(Debug, thiserror::Error)]
pub enum CrewError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("task '{task_id}' failed: {source:#}")]
    Task {
        task_id: String,
        source: anyhow::Error,
    },

    #[error("task '{task_id}' produced an unparsable task list: {message}")]
    Extract { task_id: String, message: String },
}

/// Agents and tasks ready to run, with MCP tools bound per task.
#[derive(Debug, Clone)]
pub struct Crew {
    name: String,
    process: ProcessKind,
    verbose: bool,
    agents: Vec<Agent>,
    tasks: Vec<Task>,
}

impl Crew {
    /// Resolve the roster in `config` and bind tools from `tools`.
    ///
    /// `tools` is the adapter's current snapshot; pass an empty slice when the
    /// tool server is disabled or unreachable and the crew runs without tools.
    /// Only the roster is validated; the `[mcp]` section is the adapter's concern.
    ///
    /// # Errors
    ///
    /// Returns `CrewError::Config` when the roster does not validate.
    pub fn assemble(config: &Config, tools: &[McpTool]) -> Result<Self, CrewError> {
        config.validate_roster()?;

        let agents: Vec<Agent> = config.agents.iter().map(Agent::from).collect();
        let mut tasks = Vec::with_capacity(config.tasks.len());
        for task in &config.tasks {
            let agent = agents
                .iter()
                .find(|a| a.id == task.agent)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownAgent {
                    task_id: task.id.clone(),
                    agent: task.agent.clone(),
                })?;
            tasks.push(Task {
                id: task.id.clone(),
                description: task.description.clone(),
                expected_output: task.expected_output.clone(),
                agent,
                tools: bind_tools(task, tools),
                output: task.output,
                context: task.context.clone(),
            });
        }

        tracing::info!(
            crew = config.crew.name,
            agents = agents.len(),
            tasks = tasks.len(),
            tools = tools.len(),
            "crew assembled"
        );

        Ok(Self {
            name: config.crew.name.clone(),
            process: config.crew.process,
            verbose: config.crew.verbose,
            agents,
            tasks,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn process(&self) -> ProcessKind {
        self.process
    }

    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    #[must_use]
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Human-readable execution plan: one line per task with its agent and tools.
    #[must_use]
    pub fn plan(&self) -> String {
        let mut out = format!(
            "crew {} ({}, {} agents, {} tasks)\n",
            self.name,
            self.process,
            self.agents.len(),
            self.tasks.len()
        );
        for (index, task) in self.tasks.iter().enumerate() {
            let _ = write!(
                out,
                "{:>2}. {} -> {} ({})",
                index + 1,
                task.id,
                task.agent.id,
                task.agent.role
            );
            if !task.context.is_empty() {
                let _ = write!(out, " [context: {}]", task.context.join(", "));
            }
            if task.output == OutputFormat::TaskList {
                out.push_str(" [task_list]");
            }
            if !task.tools.is_empty() {
                let names: Vec<&str> = task.tools.iter().map(|t| t.name.as_str()).collect();
                let _ = write!(out, " [tools: {}]", names.join(", "));
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(name: &str) -> McpTool {
        McpTool {
            server_id: "jira".into(),
            name: name.into(),
            description: String::new(),
            input_schema: serde_json::json!({}),
        }
    }

    #[test]
    fn assemble_default_roster() {
        let crew = Crew::assemble(&Config::default(), &[tool("create_ticket")]).unwrap();
        assert_eq!(crew.name(), "ai-agents");
        assert_eq!(crew.process(), ProcessKind::Sequential);
        assert_eq!(crew.agents().len(), 4);
        assert_eq!(crew.tasks().len(), 6);

        let jira = crew.task("jira_task_creation").unwrap();
        assert_eq!(jira.agent.id, "project_manager");
        assert_eq!(jira.tools.len(), 1);
        assert!(crew.task("system_design").unwrap().tools.is_empty());
    }

    #[test]
    fn assemble_without_tools_succeeds() {
        let crew = Crew::assemble(&Config::default(), &[]).unwrap();
        assert!(crew.tasks().iter().all(|t| t.tools.is_empty()));
    }

    #[test]
    fn assemble_rejects_invalid_roster() {
        let mut config = Config::default();
        config.tasks[2].agent = "ghost".into();
        let err = Crew::assemble(&config, &[]).unwrap_err();
        assert!(matches!(
            err,
            CrewError::Config(ConfigError::UnknownAgent { .. })
        ));
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn assemble_ignores_mcp_section() {
        let mut config = Config::default();
        config.mcp.command = Some("uvx".into());
        assert!(config.validate().is_err());
        let crew = Crew::assemble(&config, &[]).unwrap();
        assert_eq!(crew.tasks().len(), 6);
    }

    #[test]
    fn plan_lists_tasks_with_agents_and_tools() {
        let crew = Crew::assemble(&Config::default(), &[tool("create_ticket")]).unwrap();
        let plan = crew.plan();
        assert!(plan.starts_with("crew ai-agents (sequential, 4 agents, 6 tasks)"));
        assert!(plan.contains(" 1. requirements_analysis -> system_analyst (System Analyst)"));
        assert!(plan.contains("project_task_planning -> project_manager"));
        assert!(plan.contains("[task_list]"));
        assert!(plan.contains("[tools: create_ticket]"));
        assert_eq!(plan.lines().count(), 7);
    }
}
