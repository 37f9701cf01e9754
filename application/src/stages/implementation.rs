//! Implementation stage: execute the approved plan one atomic task at a
//! time.
//!
//! The controller drives this stage one call per atomic task, persisting
//! state and checking cancellation between calls. Each call follows the
//! same shape: gather file-scoped research, ask the model for a diff
//! instruction, hand it to the diff applier, then reset the scratchpad and
//! advance. A failed edit retries once with the failure appended as
//! context; a second failure is recorded and the run continues.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use planwright_domain::{
    AtomicTask, DiffInstruction, FailedAtomic, ImplementationTask, Message, StateDelta,
    WorkflowState,
};
use tracing::{debug, warn};

use crate::error::StageError;
use crate::ports::diff_applier::DiffApplier;
use crate::ports::event_publisher::{EventMetadata, StageEmitter};
use crate::ports::file_context::FileContext;
use crate::ports::llm_gateway::LlmGateway;

use super::StageOutput;

/// Attempts per atomic task: the initial try plus one retry.
const ATOMIC_ATTEMPTS: usize = 2;

pub struct ImplementationStage {
    gateway: Arc<dyn LlmGateway>,
    applier: Arc<dyn DiffApplier>,
    files: Arc<dyn FileContext>,
}

impl ImplementationStage {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        applier: Arc<dyn DiffApplier>,
        files: Arc<dyn FileContext>,
    ) -> Self {
        Self {
            gateway,
            applier,
            files,
        }
    }

    /// Execute the current atomic task and advance past it.
    ///
    /// The returned delta always moves the state forward: success and
    /// recorded failure both advance to the next atomic task, and a
    /// file-level failure skips the rest of the task. Calling this with no
    /// current task is a controller bug and fatal.
    pub async fn run_next(
        &self,
        state: &WorkflowState,
        emitter: &StageEmitter<'_>,
    ) -> Result<StageOutput, StageError> {
        let task = state
            .current_task()
            .ok_or_else(|| StageError::Fatal("no current task to implement".to_string()))?;
        let atomic = state
            .current_atomic()
            .ok_or_else(|| StageError::Fatal("no current atomic task".to_string()))?;

        let file_path = PathBuf::from(&state.working_directory).join(&task.file_path);
        let started = Instant::now();

        emitter.emit_with(
            format!(
                "applying edit {}.{}: {}",
                state.current_task_index + 1,
                state.current_atomic_index + 1,
                atomic.instruction
            ),
            EventMetadata::with_model(self.gateway.model_name()).task(task.file_path.clone()),
        );

        // Research: target file plus a shallow directory overview. Losing
        // the file is fatal for the whole task, not just this atomic.
        let contents = match self.files.read_file(&file_path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(file = %task.file_path, error = %e, "skipping task, file unreadable");
                emitter.emit_with(
                    format!("skipping task: cannot read {}", task.file_path),
                    EventMetadata::default().task(task.file_path.clone()),
                );
                let failure = FailedAtomic {
                    task_index: state.current_task_index,
                    atomic_index: state.current_atomic_index,
                    file_path: task.file_path.clone(),
                    reason: format!("file unreadable, task skipped: {e}"),
                };
                return Ok(StageOutput::new(
                    StateDelta::new()
                        .clear_research()
                        .record_failure(failure)
                        .skip_task(),
                )
                .with_message(Message::note(format!(
                    "Skipped remaining edits to {}: file unreadable",
                    task.file_path
                ))));
            }
        };
        let overview = self
            .files
            .directory_overview(file_path.parent().unwrap_or(Path::new(".")))
            .unwrap_or_default();

        let mut research = vec![
            Message::research(format!("Contents of {}:\n{}", task.file_path, contents)),
            Message::research(format!("Files alongside: {}", overview.join(", "))),
        ];

        let mut last_failure: Option<String> = None;
        for attempt in 1..=ATOMIC_ATTEMPTS {
            let prompt = self.build_diff_prompt(task, atomic, &contents, last_failure.as_deref());
            match self.attempt_edit(&file_path, &prompt).await {
                Ok(response) => {
                    research.push(Message::research(response));
                    debug!(
                        file = %task.file_path,
                        attempt,
                        "atomic edit applied"
                    );
                    emitter.emit_with(
                        format!("edit applied to {}", task.file_path),
                        EventMetadata::with_model(self.gateway.model_name())
                            .task(task.file_path.clone())
                            .duration(started.elapsed().as_secs_f64()),
                    );
                    let mut output =
                        StageOutput::new(StateDelta::new().clear_research().advance());
                    output.messages = research;
                    return Ok(output);
                }
                Err(reason) => {
                    warn!(file = %task.file_path, attempt, %reason, "atomic edit failed");
                    last_failure = Some(reason);
                }
            }
        }

        // Both attempts failed: record the failure and keep the run alive.
        let reason = last_failure.unwrap_or_else(|| "unknown failure".to_string());
        emitter.emit_with(
            format!(
                "edit to {} failed after retry, continuing with the next task",
                task.file_path
            ),
            EventMetadata::default().task(task.file_path.clone()),
        );
        let failure = FailedAtomic {
            task_index: state.current_task_index,
            atomic_index: state.current_atomic_index,
            file_path: task.file_path.clone(),
            reason,
        };
        Ok(StageOutput::new(
            StateDelta::new()
                .clear_research()
                .record_failure(failure.clone())
                .advance(),
        )
        .with_message(Message::note(format!(
            "Edit {}.{} to {} failed after retry: {}",
            failure.task_index + 1,
            failure.atomic_index + 1,
            failure.file_path,
            failure.reason
        ))))
    }

    /// One produce-and-apply attempt. Returns the model response on
    /// success, the failure reason otherwise.
    async fn attempt_edit(&self, file_path: &Path, prompt: &str) -> Result<String, String> {
        let response = self
            .gateway
            .complete(prompt)
            .await
            .map_err(|e| format!("model call failed: {e}"))?;

        let diff = parse_diff_instruction(&response)
            .ok_or_else(|| "response contained no diff instruction".to_string())?;

        self.applier
            .apply(file_path, &diff)
            .await
            .map_err(|e| e.to_string())?;

        Ok(response)
    }

    fn build_diff_prompt(
        &self,
        task: &ImplementationTask,
        atomic: &AtomicTask,
        contents: &str,
        last_failure: Option<&str>,
    ) -> String {
        let mut prompt = format!(
            "You are editing {path}.\nGoal for this file: {goal}\n\nCurrent contents:\n{contents}\n\n\
             Edit to make now: {instruction}\n",
            path = task.file_path,
            goal = task.goal,
            instruction = atomic.instruction,
        );
        if !atomic.context.is_empty() {
            prompt.push_str(&format!("Context: {}\n", atomic.context));
        }
        if let Some(failure) = last_failure {
            prompt.push_str(&format!(
                "\nThe previous attempt failed: {failure}\nProduce a corrected instruction.\n"
            ));
        }
        prompt.push_str(
            "\nRespond with JSON only:\n\
             {\"original_snippet\": \"exact text from the file to change\", \
             \"change_instruction\": \"how that snippet should change\"}\n",
        );
        prompt
    }
}

/// Parse a [`DiffInstruction`] from model output: a ` ```json` fenced block
/// or a raw JSON response.
pub fn parse_diff_instruction(response: &str) -> Option<DiffInstruction> {
    let mut in_block = false;
    let mut block = String::new();
    for line in response.lines() {
        let trimmed = line.trim();
        if !in_block && (trimmed == "```json" || trimmed == "```") {
            in_block = true;
            block.clear();
        } else if in_block && trimmed == "```" {
            if let Ok(diff) = serde_json::from_str::<DiffInstruction>(&block) {
                return Some(diff);
            }
            in_block = false;
        } else if in_block {
            block.push_str(line);
            block.push('\n');
        }
    }

    serde_json::from_str::<DiffInstruction>(response.trim()).ok()
}
