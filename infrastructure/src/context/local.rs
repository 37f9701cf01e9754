//! File research against the local filesystem.

use std::path::Path;

use planwright_application::ports::file_context::{FileContext, FileContextError};

pub struct LocalFileContext;

impl LocalFileContext {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalFileContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FileContext for LocalFileContext {
    fn read_file(&self, path: &Path) -> Result<String, FileContextError> {
        std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FileContextError::NotFound(path.display().to_string()),
            _ => FileContextError::Unreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            },
        })
    }

    fn directory_overview(&self, dir: &Path) -> Result<Vec<String>, FileContextError> {
        let entries = std::fs::read_dir(dir).map_err(|e| FileContextError::Unreadable {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }
}
