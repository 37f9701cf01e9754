//! Stage-to-controller state deltas.
//!
//! Every stage returns a partial update rather than mutating shared state.
//! The controller applies the whole delta after the stage call succeeds, or
//! none of it — a failed stage leaves the committed state untouched.

use serde::{Deserialize, Serialize};

use crate::plan::ImplementationPlan;

use super::state::{FailedAtomic, WorkflowState};

/// How a delta affects the stored plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PlanUpdate {
    /// Leave the plan as it is
    #[default]
    Keep,
    /// Install a newly generated plan
    Set(ImplementationPlan),
    /// Discard the plan (revision requested)
    Clear,
}

/// A partial update to [`WorkflowState`], applied atomically.
///
/// Field application order matters and is fixed by [`StateDelta::apply`]:
/// the scratchpad clear runs first, so a delta can reset the research
/// scratchpad while its own side messages (appended by the controller
/// after `apply`) become the fresh scratchpad contents.
#[derive(Debug, Clone, Default)]
pub struct StateDelta {
    pub clear_research: bool,
    pub plan: PlanUpdate,
    /// `Some(true)` approval, `Some(false)` revision; `None` leaves the
    /// decision untouched
    pub plan_approved: Option<bool>,
    /// Revision feedback (stored verbatim); ignored unless
    /// `plan_approved == Some(false)`
    pub human_feedback: Option<String>,
    /// Record one atomic task as failed after retry
    pub failed_atomic: Option<FailedAtomic>,
    /// Skip the rest of the current task (file-level failure)
    pub skip_task: bool,
    /// Advance to the next atomic task
    pub advance_atomic: bool,
}

impl StateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_plan(mut self, plan: ImplementationPlan) -> Self {
        self.plan = PlanUpdate::Set(plan);
        self
    }

    pub fn approve(mut self) -> Self {
        self.plan_approved = Some(true);
        self
    }

    pub fn revise(mut self, feedback: impl Into<String>) -> Self {
        self.plan_approved = Some(false);
        self.human_feedback = Some(feedback.into());
        self.plan = PlanUpdate::Clear;
        self
    }

    pub fn record_failure(mut self, failure: FailedAtomic) -> Self {
        self.failed_atomic = Some(failure);
        self
    }

    pub fn skip_task(mut self) -> Self {
        self.skip_task = true;
        self
    }

    pub fn advance(mut self) -> Self {
        self.advance_atomic = true;
        self
    }

    pub fn clear_research(mut self) -> Self {
        self.clear_research = true;
        self
    }

    /// Merge this delta into `state`. Infallible: deltas are constructed by
    /// stages from the same committed state they are applied to.
    pub fn apply(self, state: &mut WorkflowState) {
        if self.clear_research {
            state.clear_research_scratchpad();
        }

        match self.plan {
            PlanUpdate::Keep => {}
            PlanUpdate::Set(plan) => state.set_plan(plan),
            PlanUpdate::Clear => state.plan = None,
        }

        match self.plan_approved {
            Some(true) => state.record_approval(),
            Some(false) => {
                let feedback = self.human_feedback.unwrap_or_default();
                state.record_revision(feedback);
            }
            None => {}
        }

        if let Some(failure) = self.failed_atomic {
            state.record_failed_atomic(failure);
        }

        if self.skip_task {
            state.skip_current_task();
        } else if self.advance_atomic {
            state.advance_atomic();
        }
    }
}
