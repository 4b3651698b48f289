use std::collections::HashMap;
use std::future::Future;

use super::output::{CrewOutput, TaskResult, extract_task_list};
use super::task::Task;
use super::{Crew, CrewError};
use crate::config::OutputFormat;

/// What the runner receives for one task.
#[derive(Debug)]
pub struct TaskRequest<'a> {
    pub task: &'a Task,
    pub prompt: String,
    pub context: Vec<&'a TaskResult>,
}

/// Seam to the agent framework that actually performs a task.
pub trait TaskRunner: Send + Sync {
    fn run(&self, request: &TaskRequest<'_>)
    -> impl Future<Output = anyhow::Result<String>> + Send;
}

impl Crew {
    /// Execute every task in declaration order.
    ///
    /// A task sees the results of its `context` tasks, or the previous task's
    /// result when it declares no context. The first failing task stops the run.
    ///
    /// # Errors
    ///
    /// Returns `CrewError::Task` when the runner fails and `CrewError::Extract`
    /// when a `task_list` task produces output that does not parse.
    pub async fn kickoff<R: TaskRunner>(
        &self,
        runner: &R,
        inputs: &HashMap<String, String>,
    ) -> Result<CrewOutput, CrewError> {
        let mut results: Vec<TaskResult> = Vec::with_capacity(self.tasks.len());

        for (index, task) in self.tasks.iter().enumerate() {
            tracing::info!(
                crew = self.name,
                task = task.id,
                agent = task.agent.id,
                step = index + 1,
                of = self.tasks.len(),
                tools = task.tools.len(),
                "starting task"
            );

            let raw = {
                let context = context_for(task, &results);
                let request = TaskRequest {
                    task,
                    prompt: task.render_prompt(inputs, &context),
                    context,
                };
                if self.verbose {
                    tracing::debug!(task = task.id, prompt = request.prompt, "task prompt");
                }
                runner
                    .run(&request)
                    .await
                    .map_err(|source| CrewError::Task {
                        task_id: task.id.clone(),
                        source,
                    })?
            };

            let task_list = match task.output {
                OutputFormat::Text => None,
                OutputFormat::TaskList => {
                    Some(extract_task_list(&raw).map_err(|e| CrewError::Extract {
                        task_id: task.id.clone(),
                        message: e.to_string(),
                    })?)
                }
            };

            tracing::info!(task = task.id, bytes = raw.len(), "task finished");
            results.push(TaskResult {
                task_id: task.id.clone(),
                agent_id: task.agent.id.clone(),
                raw,
                task_list,
            });
        }

        Ok(CrewOutput { results })
    }
}

fn context_for<'a>(task: &Task, results: &'a [TaskResult]) -> Vec<&'a TaskResult> {
    if task.context.is_empty() {
        return results.last().into_iter().collect();
    }
    task.context
        .iter()
        .filter_map(|id| results.iter().find(|r| &r.task_id == id))
        .collect()
}
