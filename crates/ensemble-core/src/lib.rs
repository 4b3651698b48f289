//! Configuration loading, crew roster, task-tool binding, and sequential execution.

pub mod config;
pub mod crew;

pub use config::{Config, ConfigError};
pub use crew::{Crew, CrewError, CrewOutput, TaskRequest, TaskResult, TaskRunner};
