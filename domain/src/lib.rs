//! Domain layer for planwright
//!
//! This crate contains the core business logic, entities, and value objects
//! for the plan-first agent workflow. It has no dependencies on
//! infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Plan, then implement
//!
//! A run moves through two agent phases separated by a human gate:
//!
//! - **Planning** produces an [`ImplementationPlan`]: per-file tasks, each
//!   broken into atomic instructions.
//! - **The gate** renders the plan for a human, who either approves it or
//!   sends it back for revision with free-text feedback.
//! - **Implementation** walks the approved plan one atomic task at a time,
//!   producing one [`DiffInstruction`] per atomic task.
//!
//! ## Workflow state
//!
//! [`WorkflowState`] is the durable record of a run. It is mutated only by
//! applying a [`StateDelta`] returned from a stage, which keeps transitions
//! all-or-nothing and makes the record safe to persist between stages.

pub mod decision;
pub mod error;
pub mod message;
pub mod plan;
pub mod workflow;

// Re-export commonly used types
pub use decision::{Classification, Decision, classify_reply, strip_reasoning};
pub use error::DomainError;
pub use message::{Message, MessageKind, Sender};
pub use plan::{
    AtomicTask, DiffInstruction, ImplementationPlan, ImplementationTask,
    parser::{parse_plan, parse_plan_json},
    render::render_plan,
};
pub use workflow::{
    delta::{PlanUpdate, StateDelta},
    phase::WorkflowPhase,
    state::{FailedAtomic, WorkflowState},
};
