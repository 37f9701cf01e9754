//! Human gate stage: render the plan for review, then resolve the reply.
//!
//! The gate has two halves because the run suspends between them. `render`
//! produces the review prompt handed back with the suspension token;
//! `resolve` classifies the reply once the run is resumed. Ambiguous
//! replies resolve by policy, never by re-prompting, and every policy
//! resolution is logged.

use planwright_domain::{
    Decision, ImplementationPlan, Message, StateDelta, classify_reply, render_plan,
};
use tracing::{info, warn};

use crate::config::WorkflowConfig;
use crate::ports::event_publisher::StageEmitter;

use super::StageOutput;

pub struct HumanGateStage {
    config: WorkflowConfig,
}

impl HumanGateStage {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Deterministic, human-readable rendering of the plan. Rendering the
    /// same plan twice yields the same text.
    pub fn render(&self, plan: &ImplementationPlan) -> String {
        render_plan(plan)
    }

    /// Classify the reviewer's reply and turn it into a state update.
    ///
    /// Appends exactly one synthesized message recording the decision,
    /// tagged as coming from the human.
    pub fn resolve(&self, reply: &str, emitter: &StageEmitter<'_>) -> StageOutput {
        let fallback = self.config.ambiguous_reply.decision();
        let classification = classify_reply(reply, fallback);

        if classification.ambiguous {
            warn!(
                policy = fallback.as_str(),
                reply, "ambiguous review reply resolved by policy"
            );
            emitter.emit(format!(
                "ambiguous reply resolved to '{}' by policy",
                fallback.as_str()
            ));
        }

        match classification.decision {
            Decision::Approve => {
                info!("plan approved");
                emitter.emit("plan approved, moving to implementation");
                StageOutput::new(StateDelta::new().approve()).with_message(
                    Message::human_decision(format!("Approved the plan. Reply: {reply}")),
                )
            }
            Decision::Revise => {
                info!("revision requested");
                emitter.emit("revision requested, regenerating plan");
                StageOutput::new(StateDelta::new().revise(reply)).with_message(
                    Message::human_decision(format!("Requested a revision. Reply: {reply}")),
                )
            }
        }
    }
}
