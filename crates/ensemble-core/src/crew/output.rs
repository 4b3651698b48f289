use serde::{Deserialize, Serialize};

/// One implementation task produced by the planning step.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TaskOutput {
    pub project_key: String,
    pub summary: String,
    pub issue_type: String,
    pub description: String,
    pub priority: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TaskList {
    pub tasks: Vec<TaskOutput>,
}

/// Outcome of a single crew task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskResult {
    pub task_id: String,
    pub agent_id: String,
    pub raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_list: Option<TaskList>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrewOutput {
    pub results: Vec<TaskResult>,
}

impl CrewOutput {
    /// Raw output of the last task, as the sequential process hands it back.
    #[must_use]
    pub fn final_output(&self) -> Option<&str> {
        self.results.last().map(|r| r.raw.as_str())
    }

    #[must_use]
    pub fn get(&self, task_id: &str) -> Option<&TaskResult> {
        self.results.iter().find(|r| r.task_id == task_id)
    }
}

/// Parse a `TaskList` from agent output.
///
/// Accepts bare JSON, a fenced ```json block, or JSON embedded in prose
/// (first `{` to last `}`).
///
/// # Errors
///
/// Returns the `serde_json` error from the last candidate tried.
pub fn extract_task_list(raw: &str) -> Result<TaskList, serde_json::Error> {
    let trimmed = raw.trim();
    if let Ok(list) = serde_json::from_str(trimmed) {
        return Ok(list);
    }
    if let Some(block) = fenced_block(trimmed)
        && let Ok(list) = serde_json::from_str(block)
    {
        return Ok(list);
    }
    let embedded = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    };
    serde_json::from_str(embedded)
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let body_start = after.find('\n')? + 1;
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"{"tasks":[{"project_key":"PM","summary":"Set up CI","issue_type":"Task","description":"Add a CI pipeline","priority":"High"}]}"#;

    #[test]
    fn parses_bare_json() {
        let list = extract_task_list(PLAN).unwrap();
        assert_eq!(list.tasks.len(), 1);
        assert_eq!(list.tasks[0].project_key, "PM");
        assert_eq!(list.tasks[0].priority, "High");
    }

    #[test]
    fn parses_fenced_json() {
        let raw = format!("Here is the plan:\n```json\n{PLAN}\n```\nLet me know.");
        let list = extract_task_list(&raw).unwrap();
        assert_eq!(list.tasks[0].summary, "Set up CI");
    }

    #[test]
    fn parses_json_embedded_in_prose() {
        let raw = format!("Plan follows {PLAN} end.");
        let list = extract_task_list(&raw).unwrap();
        assert_eq!(list.tasks[0].issue_type, "Task");
    }

    #[test]
    fn rejects_missing_fields() {
        let raw = r#"{"tasks":[{"summary":"incomplete"}]}"#;
        assert!(extract_task_list(raw).is_err());
    }

    #[test]
    fn rejects_prose() {
        assert!(extract_task_list("no plan today").is_err());
    }

    #[test]
    fn empty_task_list_is_valid() {
        let list = extract_task_list(r#"{"tasks": []}"#).unwrap();
        assert!(list.tasks.is_empty());
    }

    #[test]
    fn final_output_is_last_result() {
        let output = CrewOutput {
            results: vec![
                TaskResult {
                    task_id: "a".into(),
                    agent_id: "x".into(),
                    raw: "first".into(),
                    task_list: None,
                },
                TaskResult {
                    task_id: "b".into(),
                    agent_id: "y".into(),
                    raw: "second".into(),
                    task_list: None,
                },
            ],
        };
        assert_eq!(output.final_output(), Some("second"));
        assert_eq!(output.get("a").unwrap().raw, "first");
        assert!(output.get("missing").is_none());
        assert!(CrewOutput::default().final_output().is_none());
    }
}
