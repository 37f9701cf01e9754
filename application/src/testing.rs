//! Scripted doubles shared by stage and controller tests.

use async_trait::async_trait;
use planwright_domain::DiffInstruction;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::ports::diff_applier::{DiffApplier, DiffApplyError};
use crate::ports::event_publisher::{AgentEvent, ChannelKey, EventPublisher};
use crate::ports::file_context::{FileContext, FileContextError};
use crate::ports::llm_gateway::{GatewayError, LlmGateway};

/// Gateway that replays a fixed sequence of responses.
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<String, GatewayError>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub fn new(responses: Vec<Result<String, GatewayError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(responses: &[&str]) -> Self {
        Self::new(responses.iter().map(|r| Ok(r.to_string())).collect())
    }
}

#[async_trait]
impl LlmGateway for ScriptedGateway {
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::Unavailable("script exhausted".into())))
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

/// Applier that replays a fixed sequence of results.
pub struct ScriptedApplier {
    results: Mutex<VecDeque<Result<(), DiffApplyError>>>,
    pub applied: Mutex<Vec<(PathBuf, DiffInstruction)>>,
}

impl ScriptedApplier {
    pub fn new(results: Vec<Result<(), DiffApplyError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            applied: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl DiffApplier for ScriptedApplier {
    async fn apply(&self, file_path: &Path, diff: &DiffInstruction) -> Result<(), DiffApplyError> {
        let result = self
            .results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()));
        if result.is_ok() {
            self.applied
                .lock()
                .unwrap()
                .push((file_path.to_path_buf(), diff.clone()));
        }
        result
    }
}

/// File context backed by an in-memory map of path -> contents.
#[derive(Default)]
pub struct StaticFileContext {
    files: HashMap<PathBuf, String>,
}

impl StaticFileContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }
}

impl FileContext for StaticFileContext {
    fn read_file(&self, path: &Path) -> Result<String, FileContextError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| FileContextError::NotFound(path.display().to_string()))
    }

    fn directory_overview(&self, dir: &Path) -> Result<Vec<String>, FileContextError> {
        let mut names: Vec<String> = self
            .files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        names.sort();
        Ok(names)
    }
}

/// Publisher that records every event it sees.
#[derive(Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<AgentEvent>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texts(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.text.clone())
            .collect()
    }

    pub fn stage_names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.stage_name.clone())
            .collect()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, _key: &ChannelKey, event: AgentEvent) {
        self.events.lock().unwrap().push(event);
    }
}
