//! Durable state store port, plus an in-memory adapter for tests and
//! single-process runs.

use async_trait::async_trait;
use planwright_domain::WorkflowState;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

use super::event_publisher::ChannelKey;

/// Errors from the state store
#[derive(Error, Debug, Clone)]
pub enum StateStoreError {
    #[error("State store I/O error: {0}")]
    Io(String),

    #[error("Stored state is corrupt: {0}")]
    Corrupt(String),
}

/// Port for persisting [`WorkflowState`] between steps and across restarts.
///
/// A run is keyed by its `(user_id, run_id)` pair. `save` must be atomic:
/// a reader never observes a half-written state.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn load(&self, key: &ChannelKey) -> Result<Option<WorkflowState>, StateStoreError>;

    async fn save(&self, key: &ChannelKey, state: &WorkflowState) -> Result<(), StateStoreError>;

    /// Move a finished run out of the active set.
    async fn archive(&self, key: &ChannelKey) -> Result<(), StateStoreError>;
}

/// In-memory store. No durability across processes; suspend/resume within
/// one process works because the map outlives individual runs.
#[derive(Default)]
pub struct InMemoryStateStore {
    runs: Mutex<HashMap<ChannelKey, WorkflowState>>,
    archived: Mutex<HashMap<ChannelKey, WorkflowState>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn archived_count(&self) -> usize {
        self.archived.lock().unwrap().len()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self, key: &ChannelKey) -> Result<Option<WorkflowState>, StateStoreError> {
        Ok(self.runs.lock().unwrap().get(key).cloned())
    }

    async fn save(&self, key: &ChannelKey, state: &WorkflowState) -> Result<(), StateStoreError> {
        self.runs.lock().unwrap().insert(key.clone(), state.clone());
        Ok(())
    }

    async fn archive(&self, key: &ChannelKey) -> Result<(), StateStoreError> {
        if let Some(state) = self.runs.lock().unwrap().remove(key) {
            self.archived.lock().unwrap().insert(key.clone(), state);
        }
        Ok(())
    }
}
