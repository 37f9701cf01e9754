//! Ports (interfaces) for external collaborators.
//!
//! Following the Ports and Adapters pattern: the application layer defines
//! the seams, infrastructure implements them. Every external collaborator
//! (model inference, diff application, durable state, file research, event
//! delivery) enters through exactly one narrow trait here.

pub mod diff_applier;
pub mod event_publisher;
pub mod file_context;
pub mod llm_gateway;
pub mod state_store;
