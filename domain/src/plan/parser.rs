//! Plan parsing from LLM responses.
//!
//! Extracts a structured [`ImplementationPlan`] from model output — either
//! a ` ```plan` fenced code block containing JSON, or a response that is
//! raw JSON end to end.

use super::{AtomicTask, ImplementationPlan, ImplementationTask};

/// Parse a plan from model response text.
///
/// Supports two formats:
/// 1. ` ```plan` fenced code blocks containing JSON
/// 2. Raw JSON (the entire response is valid JSON)
///
/// Returns `None` if no valid plan is found, or if the plan has no tasks.
pub fn parse_plan(response: &str) -> Option<ImplementationPlan> {
    // Look for ```plan ... ``` blocks
    let mut in_plan_block = false;
    let mut current_block = String::new();

    for line in response.lines() {
        if line.trim() == "```plan" {
            in_plan_block = true;
            current_block.clear();
        } else if in_plan_block && line.trim() == "```" {
            in_plan_block = false;
            if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&current_block) {
                return parse_plan_json(&parsed);
            }
        } else if in_plan_block {
            current_block.push_str(line);
            current_block.push('\n');
        }
    }

    // Try parsing the entire response as JSON
    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(response.trim()) {
        return parse_plan_json(&parsed);
    }

    None
}

/// Parse a plan from a JSON value.
///
/// Expected schema:
/// ```json
/// {
///   "tasks": [
///     {
///       "file_path": "string",
///       "goal": "string (optional)",
///       "atomic_tasks": [
///         { "instruction": "string", "context": "string (optional)" }
///       ]
///     }
///   ]
/// }
/// ```
///
/// Returns `None` if the tasks array is missing or empty, or if any task
/// has no file path. Empty plans are not plans.
pub fn parse_plan_json(json: &serde_json::Value) -> Option<ImplementationPlan> {
    let tasks = json.get("tasks")?.as_array()?;
    if tasks.is_empty() {
        return None;
    }

    let mut plan = ImplementationPlan::new();
    for task_json in tasks {
        let file_path = task_json.get("file_path").and_then(|v| v.as_str())?;
        if file_path.trim().is_empty() {
            return None;
        }
        let goal = task_json.get("goal").and_then(|v| v.as_str()).unwrap_or("");

        let mut task = ImplementationTask::new(file_path, goal);

        if let Some(atomics) = task_json.get("atomic_tasks").and_then(|v| v.as_array()) {
            for atomic_json in atomics {
                let instruction = atomic_json.get("instruction").and_then(|v| v.as_str())?;
                let context = atomic_json
                    .get("context")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                task = task.with_atomic(AtomicTask::new(instruction, context));
            }
        }

        plan.add_task(task);
    }

    Some(plan)
}
