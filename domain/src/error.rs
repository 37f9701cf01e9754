//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid phase transition: {from} -> {to}")]
    InvalidPhaseTransition { from: String, to: String },

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Task index {task_index} out of range for plan with {task_count} tasks")]
    TaskIndexOutOfRange {
        task_index: usize,
        task_count: usize,
    },
}
