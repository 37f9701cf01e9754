//! Application layer: the workflow controller, its stages, and the ports
//! infrastructure adapts.
//!
//! The flow is plan, review, implement. A [`WorkflowController`] drives a
//! run through planning, suspends it at the human gate, and on resume
//! either replans from the reviewer's feedback or walks the approved plan
//! one atomic edit at a time, persisting committed state at every step.

pub mod config;
pub mod controller;
pub mod error;
pub mod ports;
pub mod stages;
pub mod suspension;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{AmbiguousReplyPolicy, WorkflowConfig};
pub use controller::{WorkflowController, WorkflowOutcome, advance};
pub use error::{StageError, WorkflowError};
pub use ports::diff_applier::{DiffApplier, DiffApplyError};
pub use ports::event_publisher::{
    AgentEvent, ChannelKey, EventMetadata, EventPublisher, NoEventPublisher, StageEmitter,
};
pub use ports::file_context::{FileContext, FileContextError};
pub use ports::llm_gateway::{GatewayError, LlmGateway};
pub use ports::state_store::{InMemoryStateStore, StateStore, StateStoreError};
pub use stages::StageOutput;
pub use stages::human_gate::HumanGateStage;
pub use stages::implementation::ImplementationStage;
pub use stages::planning::PlanningStage;
pub use suspension::{ResumeToken, Suspension};
