//! Workflow phases and transition validation

use serde::{Deserialize, Serialize};

/// Phase of a workflow run.
///
/// Valid forward transitions:
///
/// ```text
/// Planning -> AwaitingHuman -> { Revising -> Planning | Implementing } -> Done
/// ```
///
/// `Failed` is reachable from any non-terminal phase. `Done` and `Failed`
/// are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowPhase {
    /// Generating an implementation plan from the research scratchpad
    Planning,
    /// Suspended at the human gate, waiting for a reply
    AwaitingHuman,
    /// A revision was requested; the plan has been discarded
    Revising,
    /// Walking the approved plan, one atomic task at a time
    Implementing,
    /// Run finished (possibly with recorded atomic-task failures)
    Done,
    /// Run hit an unrecoverable error
    Failed,
}

impl WorkflowPhase {
    pub fn as_str(&self) -> &str {
        match self {
            WorkflowPhase::Planning => "planning",
            WorkflowPhase::AwaitingHuman => "awaiting_human",
            WorkflowPhase::Revising => "revising",
            WorkflowPhase::Implementing => "implementing",
            WorkflowPhase::Done => "done",
            WorkflowPhase::Failed => "failed",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            WorkflowPhase::Planning => "Planning",
            WorkflowPhase::AwaitingHuman => "Awaiting Human Review",
            WorkflowPhase::Revising => "Revising",
            WorkflowPhase::Implementing => "Implementing",
            WorkflowPhase::Done => "Done",
            WorkflowPhase::Failed => "Failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowPhase::Done | WorkflowPhase::Failed)
    }

    /// Check whether a transition to `target` is valid from this phase.
    pub fn can_transition(&self, target: WorkflowPhase) -> bool {
        // Any non-terminal phase may fail
        if target == WorkflowPhase::Failed {
            return !self.is_terminal();
        }
        matches!(
            (self, target),
            (WorkflowPhase::Planning, WorkflowPhase::AwaitingHuman)
                | (WorkflowPhase::AwaitingHuman, WorkflowPhase::Revising)
                | (WorkflowPhase::AwaitingHuman, WorkflowPhase::Implementing)
                | (WorkflowPhase::Revising, WorkflowPhase::Planning)
                | (WorkflowPhase::Implementing, WorkflowPhase::Done)
        )
    }
}

impl std::fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
