//! JSON-file state store.
//!
//! One file per run under the store root, named from the `(user_id,
//! run_id)` pair. Saves write to a temp file in the same directory and
//! rename over the target, so a crashed save never leaves a half-written
//! state. Archived runs move to an `archive/` subdirectory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use planwright_application::ports::event_publisher::ChannelKey;
use planwright_application::ports::state_store::{StateStore, StateStoreError};
use planwright_domain::WorkflowState;
use tracing::debug;

pub struct JsonStateStore {
    root: PathBuf,
}

impl JsonStateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn run_path(&self, key: &ChannelKey) -> PathBuf {
        self.root.join(Self::file_name(key))
    }

    fn archive_path(&self, key: &ChannelKey) -> PathBuf {
        self.root.join("archive").join(Self::file_name(key))
    }

    /// Identifiers may contain characters that are not filesystem-safe;
    /// replace the usual offenders.
    fn file_name(key: &ChannelKey) -> String {
        let sanitize = |s: &str| {
            s.chars()
                .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
                .collect::<String>()
        };
        format!("{}__{}.json", sanitize(&key.user_id), sanitize(&key.run_id))
    }

    async fn write_atomic(path: &Path, contents: &str) -> Result<(), StateStoreError> {
        let parent = path
            .parent()
            .ok_or_else(|| StateStoreError::Io("state path has no parent".to_string()))?;
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StateStoreError::Io(e.to_string()))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| StateStoreError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| StateStoreError::Io(e.to_string()))
    }
}

#[async_trait]
impl StateStore for JsonStateStore {
    async fn load(&self, key: &ChannelKey) -> Result<Option<WorkflowState>, StateStoreError> {
        let path = self.run_path(key);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StateStoreError::Io(e.to_string())),
        };
        let state = serde_json::from_str(&contents)
            .map_err(|e| StateStoreError::Corrupt(format!("{}: {e}", path.display())))?;
        Ok(Some(state))
    }

    async fn save(&self, key: &ChannelKey, state: &WorkflowState) -> Result<(), StateStoreError> {
        let json = serde_json::to_string_pretty(state)
            .map_err(|e| StateStoreError::Io(e.to_string()))?;
        Self::write_atomic(&self.run_path(key), &json).await?;
        debug!(channel = %key.channel_name(), phase = %state.phase, "state saved");
        Ok(())
    }

    async fn archive(&self, key: &ChannelKey) -> Result<(), StateStoreError> {
        let from = self.run_path(key);
        if !from.exists() {
            return Ok(());
        }
        let to = self.archive_path(key);
        if let Some(parent) = to.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StateStoreError::Io(e.to_string()))?;
        }
        tokio::fs::rename(&from, &to)
            .await
            .map_err(|e| StateStoreError::Io(e.to_string()))?;
        debug!(channel = %key.channel_name(), "state archived");
        Ok(())
    }
}
