mod env;
mod types;


pub use types::*;

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use ensemble_mcp::{ConnectPolicy, McpError, ToolConnectionConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("duplicate agent id '{0}'")]
    DuplicateAgent(String),

    #[error("duplicate task id '{0}'")]
    DuplicateTask(String),

    #[error("task '{task_id}' references unknown agent '{agent}'")]
    UnknownAgent { task_id: String, agent: String },

    #[error("task '{task_id}' lists '{context}' as context, which is not an earlier task")]
    InvalidContext { task_id: String, context: String },

    #[error("crew has no tasks")]
    NoTasks,

    #[error("invalid [mcp] section: {0}")]
    Mcp(String),
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Check the roster and the MCP section for consistency.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_roster()?;
        self.mcp.validate()
    }

    /// Check agents and tasks only: unique ids, known agents, and context that
    /// names earlier tasks.
    ///
    /// # Errors
    ///
    /// Returns the first roster `ConfigError` found.
    pub fn validate_roster(&self) -> Result<(), ConfigError> {
        let mut agents = HashSet::new();
        for agent in &self.agents {
            if !agents.insert(agent.id.as_str()) {
                return Err(ConfigError::DuplicateAgent(agent.id.clone()));
            }
        }

        if self.tasks.is_empty() {
            return Err(ConfigError::NoTasks);
        }

        let mut earlier = HashSet::new();
        for task in &self.tasks {
            if !agents.contains(task.agent.as_str()) {
                return Err(ConfigError::UnknownAgent {
                    task_id: task.id.clone(),
                    agent: task.agent.clone(),
                });
            }
            if let Some(missing) = task.context.iter().find(|c| !earlier.contains(c.as_str())) {
                return Err(ConfigError::InvalidContext {
                    task_id: task.id.clone(),
                    context: missing.clone(),
                });
            }
            if !earlier.insert(task.id.as_str()) {
                return Err(ConfigError::DuplicateTask(task.id.clone()));
            }
        }
        Ok(())
    }
}

impl McpConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.enabled {
            return Ok(());
        }
        if self.timeout == 0 {
            return Err(ConfigError::Mcp("timeout must be greater than zero".into()));
        }
        match (&self.url, &self.command) {
            (Some(_), Some(_)) => Err(ConfigError::Mcp(
                "set either url or command, not both".into(),
            )),
            (None, None) => Err(ConfigError::Mcp("one of url or command is required".into())),
            _ => Ok(()),
        }
    }

    /// Build the adapter connection config, or `None` when MCP is disabled.
    ///
    /// # Errors
    ///
    /// Returns `McpError::InvalidUrl` or `McpError::InvalidConfig` when the
    /// section cannot describe a connectable endpoint.
    pub fn connection(&self) -> Result<Option<ToolConnectionConfig>, McpError> {
        if !self.enabled {
            return Ok(None);
        }
        let config = match (&self.url, &self.command) {
            (Some(url), None) => ToolConnectionConfig::http(&self.id, url, self.timeout)?,
            (None, Some(command)) => ToolConnectionConfig::stdio(
                &self.id,
                command,
                self.args.clone(),
                self.env.clone(),
                self.timeout,
            )?,
            (Some(_), Some(_)) => {
                return Err(McpError::InvalidConfig(
                    "set either url or command, not both".into(),
                ));
            }
            (None, None) => {
                return Err(McpError::InvalidConfig(
                    "one of url or command is required".into(),
                ));
            }
        };
        Ok(Some(config.with_policy(ConnectPolicy {
            allowed_commands: self.allowed_commands.clone(),
            block_private_hosts: self.block_private_hosts,
        })))
    }
}
