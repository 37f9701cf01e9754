//! Workflow state machine: phases, the durable state record, and the
//! partial-update deltas stages return to the controller.

pub mod delta;
pub mod phase;
pub mod state;
