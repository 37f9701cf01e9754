//! Workflow stages.
//!
//! Each stage is a self-contained step the controller invokes: planning
//! generates a plan, the human gate renders it and resolves the reply,
//! implementation applies one atomic edit per call. Stages never touch the
//! committed state directly; they return a [`StageOutput`] the controller
//! applies and persists as one unit.

pub mod human_gate;
pub mod implementation;
pub mod planning;

use planwright_domain::{Message, StateDelta};

/// What a stage invocation hands back to the controller.
#[derive(Debug, Default)]
pub struct StageOutput {
    /// Partial state update, applied atomically
    pub delta: StateDelta,
    /// Messages to append to the history after the delta applies
    pub messages: Vec<Message>,
}

impl StageOutput {
    pub fn new(delta: StateDelta) -> Self {
        Self {
            delta,
            messages: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }
}
