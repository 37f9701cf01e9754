//! The durable workflow state record.
//!
//! `WorkflowState` is everything a run needs to resume after a suspension
//! or a process restart. It is mutated only through its methods (invoked by
//! applying a [`StateDelta`](super::delta::StateDelta)), which keep the
//! index invariants intact:
//!
//! - `current_task_index` is a valid index into `plan.tasks`, or equals
//!   `plan.tasks.len()` once implementation has finished.
//! - `current_atomic_index` resets to 0 whenever `current_task_index`
//!   advances.
//! - `plan_approved == Some(true)` implies `plan.is_some()`.
//! - A revision clears `plan`; implementation never runs on a stale plan.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::message::Message;
use crate::plan::{AtomicTask, ImplementationPlan, ImplementationTask};

use super::phase::WorkflowPhase;

/// Record of an atomic task that failed after its retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedAtomic {
    pub task_index: usize,
    pub atomic_index: usize,
    pub file_path: String,
    pub reason: String,
}

/// The durable, resumable record of a run's progress (Entity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Current phase of the state machine
    pub phase: WorkflowPhase,
    /// The current plan, if one has been generated and not discarded
    pub plan: Option<ImplementationPlan>,
    /// Index of the task currently being implemented
    pub current_task_index: usize,
    /// Index of the atomic task within the current task
    pub current_atomic_index: usize,
    /// Verbatim human feedback from the most recent revision request
    pub human_feedback: String,
    /// The gate's decision: `None` until the gate resolves
    pub plan_approved: Option<bool>,
    /// Append-only message history; only research entries are ever cleared
    pub message_history: Vec<Message>,
    /// Root directory the plan's file paths are relative to
    pub working_directory: String,
    /// Number of revision cycles so far
    pub revision_count: usize,
    /// Atomic tasks that failed after retry (partial-failure record)
    pub failed_atomics: Vec<FailedAtomic>,
    /// Error message if the run failed
    pub error: Option<String>,
}

impl WorkflowState {
    /// Create the empty state for a fresh run, starting in Planning.
    pub fn new(working_directory: impl Into<String>) -> Self {
        Self {
            phase: WorkflowPhase::Planning,
            plan: None,
            current_task_index: 0,
            current_atomic_index: 0,
            human_feedback: String::new(),
            plan_approved: None,
            message_history: Vec::new(),
            working_directory: working_directory.into(),
            revision_count: 0,
            failed_atomics: Vec::new(),
            error: None,
        }
    }

    /// Transition to a new phase, validating against the phase machine.
    pub fn transition_to(&mut self, target: WorkflowPhase) -> Result<(), DomainError> {
        if !self.phase.can_transition(target) {
            return Err(DomainError::InvalidPhaseTransition {
                from: self.phase.as_str().to_string(),
                to: target.as_str().to_string(),
            });
        }
        self.phase = target;
        Ok(())
    }

    /// Marks the run as failed with a diagnostic message.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.phase = WorkflowPhase::Failed;
    }

    // ==================== Plan & gate ====================

    /// Install a freshly generated plan and clear any prior decision.
    pub fn set_plan(&mut self, plan: ImplementationPlan) {
        self.plan = Some(plan);
        self.plan_approved = None;
    }

    /// Record an approval: the plan is frozen and feedback is cleared.
    pub fn record_approval(&mut self) {
        self.plan_approved = Some(true);
        self.human_feedback.clear();
    }

    /// Record a revision request: the feedback is kept verbatim and the
    /// plan is discarded so planning must regenerate it.
    pub fn record_revision(&mut self, feedback: impl Into<String>) {
        self.plan_approved = Some(false);
        self.human_feedback = feedback.into();
        self.plan = None;
        self.revision_count += 1;
    }

    // ==================== Message history ====================

    pub fn append_message(&mut self, message: Message) {
        self.message_history.push(message);
    }

    /// The research scratchpad: history filtered to research entries.
    pub fn research_messages(&self) -> impl Iterator<Item = &Message> {
        self.message_history.iter().filter(|m| m.is_research())
    }

    /// Explicit scratchpad reset. Removes research entries only; decisions
    /// and notes are permanent.
    pub fn clear_research_scratchpad(&mut self) {
        self.message_history.retain(|m| !m.is_research());
    }

    // ==================== Implementation progress ====================

    /// The task currently being implemented, if any remain.
    pub fn current_task(&self) -> Option<&ImplementationTask> {
        self.plan.as_ref()?.tasks.get(self.current_task_index)
    }

    /// The atomic task currently being implemented, if any.
    pub fn current_atomic(&self) -> Option<&AtomicTask> {
        self.current_task()?.atomic_tasks.get(self.current_atomic_index)
    }

    /// Whether every task in the plan has been walked.
    pub fn implementation_complete(&self) -> bool {
        match &self.plan {
            Some(plan) => self.current_task_index >= plan.tasks.len(),
            None => false,
        }
    }

    /// Advance to the next atomic task, rolling over to the next task (and
    /// resetting the atomic index to 0) when the current task is exhausted.
    pub fn advance_atomic(&mut self) {
        let Some(task) = self.current_task() else {
            return;
        };
        let atomics_in_task = task.atomic_tasks.len();
        self.current_atomic_index += 1;
        if self.current_atomic_index >= atomics_in_task {
            self.current_task_index += 1;
            self.current_atomic_index = 0;
        }
    }

    /// Skip the remainder of the current task (file-level fatal failure).
    pub fn skip_current_task(&mut self) {
        if self.current_task().is_some() {
            self.current_task_index += 1;
            self.current_atomic_index = 0;
        }
    }

    pub fn record_failed_atomic(&mut self, failure: FailedAtomic) {
        self.failed_atomics.push(failure);
    }
}
