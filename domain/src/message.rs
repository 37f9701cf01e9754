//! Message history entities

use serde::{Deserialize, Serialize};

/// Who produced a message in the run's history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    Human,
    Agent,
    System,
}

impl Sender {
    pub fn as_str(&self) -> &str {
        match self {
            Sender::Human => "human",
            Sender::Agent => "agent",
            Sender::System => "system",
        }
    }
}

/// What role a message plays in the workflow.
///
/// `Research` messages form the working scratchpad for a stage and are the
/// only kind removed by the explicit scratchpad reset between atomic tasks.
/// `Decision` and `Note` messages are permanent history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// Accumulated working context (prompts, tool output, model responses)
    Research,
    /// A recorded human approve/revise decision
    Decision,
    /// Permanent workflow annotation (stage summaries, failure records)
    Note,
}

/// A message in a run's history (Entity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub kind: MessageKind,
    pub content: String,
}

impl Message {
    /// A research-scratchpad entry produced by an agent stage.
    pub fn research(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::Agent,
            kind: MessageKind::Research,
            content: content.into(),
        }
    }

    /// The synthesized record of a human gate decision.
    pub fn human_decision(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::Human,
            kind: MessageKind::Decision,
            content: content.into(),
        }
    }

    /// A permanent workflow annotation.
    pub fn note(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::System,
            kind: MessageKind::Note,
            content: content.into(),
        }
    }

    pub fn is_research(&self) -> bool {
        self.kind == MessageKind::Research
    }
}
