//! Diff-application collaborator port.

use async_trait::async_trait;
use planwright_domain::DiffInstruction;
use std::path::Path;
use thiserror::Error;

/// Errors from applying a diff instruction
#[derive(Error, Debug, Clone)]
pub enum DiffApplyError {
    /// The edit could not be applied (snippet missing, write failed, the
    /// applier's own model call failed). Retryable once with the reason
    /// appended as context.
    #[error("Diff application failed: {0}")]
    Failed(String),
}

/// Port for applying one [`DiffInstruction`] to one file.
#[async_trait]
pub trait DiffApplier: Send + Sync {
    async fn apply(&self, file_path: &Path, diff: &DiffInstruction) -> Result<(), DiffApplyError>;
}
