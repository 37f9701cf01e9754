//! Planning stage: turn the request (and any reviewer feedback) into a
//! structured implementation plan.

use std::sync::Arc;
use std::time::Instant;

use planwright_domain::{Message, StateDelta, WorkflowState, parse_plan};
use tracing::{debug, warn};

use crate::config::WorkflowConfig;
use crate::error::StageError;
use crate::ports::event_publisher::{EventMetadata, StageEmitter};
use crate::ports::llm_gateway::LlmGateway;

use super::StageOutput;

const PLAN_FORMAT_INSTRUCTIONS: &str = r#"Respond with an implementation plan in a ```plan fenced code block containing JSON:

```plan
{
  "tasks": [
    {
      "file_path": "relative/path/to/file",
      "goal": "what the edits to this file accomplish",
      "atomic_tasks": [
        {"instruction": "one localized edit", "context": "surrounding detail"}
      ]
    }
  ]
}
```

Order tasks and atomic tasks so later edits may depend on earlier ones.
Every task must name a file and contain at least one atomic task."#;

pub struct PlanningStage {
    gateway: Arc<dyn LlmGateway>,
    config: WorkflowConfig,
}

impl PlanningStage {
    pub fn new(gateway: Arc<dyn LlmGateway>, config: WorkflowConfig) -> Self {
        Self { gateway, config }
    }

    /// Generate a plan from the state's research scratchpad and any
    /// reviewer feedback. Model failures and unparseable responses retry
    /// within the configured budget; a parsed plan that fails structural
    /// validation is fatal.
    pub async fn run(
        &self,
        state: &WorkflowState,
        emitter: &StageEmitter<'_>,
    ) -> Result<StageOutput, StageError> {
        let prompt = self.build_prompt(state);
        let started = Instant::now();

        for attempt in 1..=self.config.max_plan_retries {
            emitter.emit_with(
                if attempt == 1 {
                    "generating implementation plan".to_string()
                } else {
                    format!("retrying plan generation (attempt {attempt})")
                },
                EventMetadata::with_model(self.gateway.model_name()),
            );

            let response = match self.gateway.complete(&prompt).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(attempt, error = %e, "planning model call failed");
                    continue;
                }
            };

            let Some(plan) = parse_plan(&response) else {
                warn!(attempt, "planning response contained no parseable plan");
                continue;
            };

            plan.validate()
                .map_err(|e| StageError::Fatal(format!("invalid plan structure: {e}")))?;

            debug!(
                tasks = plan.task_count(),
                atomics = plan.atomic_count(),
                "plan generated"
            );
            emitter.emit_with(
                format!(
                    "plan ready: {} file(s), {} atomic edit(s)",
                    plan.task_count(),
                    plan.atomic_count()
                ),
                EventMetadata::with_model(self.gateway.model_name())
                    .duration(started.elapsed().as_secs_f64()),
            );

            return Ok(StageOutput::new(StateDelta::new().set_plan(plan))
                .with_message(Message::research(response)));
        }

        Err(StageError::Fatal(format!(
            "planning failed after {} attempt(s)",
            self.config.max_plan_retries
        )))
    }

    fn build_prompt(&self, state: &WorkflowState) -> String {
        let mut prompt = String::new();
        prompt.push_str("You are planning code changes for a software project.\n");
        prompt.push_str(&format!(
            "Working directory: {}\n\n",
            state.working_directory
        ));

        let research: Vec<&str> = state
            .research_messages()
            .map(|m| m.content.as_str())
            .collect();
        if !research.is_empty() {
            prompt.push_str("Context gathered so far:\n");
            for entry in research {
                prompt.push_str(entry);
                prompt.push('\n');
            }
            prompt.push('\n');
        }

        if !state.human_feedback.is_empty() {
            prompt.push_str(
                "A reviewer rejected the previous plan. Their feedback is advisory; \
                 weigh it while producing a fresh plan:\n",
            );
            prompt.push_str(&state.human_feedback);
            prompt.push_str("\n\n");
        }

        prompt.push_str(PLAN_FORMAT_INSTRUCTIONS);
        prompt
    }
}
