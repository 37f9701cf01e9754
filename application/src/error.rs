//! Application-layer errors.

use thiserror::Error;

use crate::ports::state_store::StateStoreError;

/// Errors a single stage invocation can return. Transient trouble is
/// handled inside the stages (bounded retries, recorded skips); only
/// unrecoverable conditions surface here.
#[derive(Error, Debug)]
pub enum StageError {
    /// The stage cannot make progress and the run must fail.
    #[error("Fatal stage failure: {0}")]
    Fatal(String),

    /// Cancellation observed mid-stage.
    #[error("Operation cancelled")]
    Cancelled,
}

/// Errors from driving a workflow run.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("A run is already active for {0}")]
    AlreadyActive(String),

    #[error("No suspended run found for token {0}")]
    NoSuchRun(String),

    #[error("Invalid resume token: {0}")]
    InvalidToken(String),

    #[error("Run is not awaiting human review (phase: {0})")]
    NotSuspended(String),

    #[error("Revision limit of {0} exceeded")]
    RevisionLimitExceeded(usize),

    #[error(transparent)]
    StateStore(#[from] StateStoreError),

    #[error("Operation cancelled")]
    Cancelled,
}
