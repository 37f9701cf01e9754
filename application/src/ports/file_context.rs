//! File research port.
//!
//! Implementation research is file-scoped: the stage reads the target file
//! and a shallow overview of its directory, nothing else. Synchronous on
//! purpose — adapters read local files.

use std::path::Path;
use thiserror::Error;

/// Errors from file research
#[derive(Error, Debug, Clone)]
pub enum FileContextError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Failed to read {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

/// Port for gathering file-scoped research context.
pub trait FileContext: Send + Sync {
    /// Full contents of one file.
    fn read_file(&self, path: &Path) -> Result<String, FileContextError>;

    /// Names of the entries in a directory, sorted.
    fn directory_overview(&self, dir: &Path) -> Result<Vec<String>, FileContextError>;
}
