//! On-disk configuration schema.
//!
//! Everything is optional in the file; missing sections and fields fall
//! back to defaults, so a minimal `planwright.toml` can set just the one
//! thing it cares about.

use std::path::PathBuf;

use planwright_application::WorkflowConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub workflow: WorkflowConfig,
    pub events: EventsConfig,
    pub gateway: GatewayConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Per-run channel capacity before the delivery ladder's slow paths
    /// kick in
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: 256 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Inference command; receives the prompt on stdin
    pub program: String,
    pub args: Vec<String>,
    /// Model name reported in event metadata
    pub model: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            program: "llm".to_string(),
            args: Vec::new(),
            model: "default".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where run state lives; defaults to the platform data directory
    pub state_dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn resolved_state_dir(&self) -> PathBuf {
        if let Some(dir) = &self.state_dir {
            return dir.clone();
        }
        dirs::data_local_dir()
            .map(|d| d.join("planwright").join("runs"))
            .unwrap_or_else(|| PathBuf::from(".planwright/runs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_fills_defaults() {
        let config: FileConfig = toml::from_str(
            r#"
            [workflow]
            max_revisions = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.workflow.max_revisions, 2);
        assert_eq!(config.workflow.max_plan_retries, 3);
        assert_eq!(config.events.capacity, 256);
        assert_eq!(config.gateway.program, "llm");
    }

    #[test]
    fn test_explicit_state_dir_wins() {
        let storage = StorageConfig {
            state_dir: Some(PathBuf::from("/custom/runs")),
        };
        assert_eq!(storage.resolved_state_dir(), PathBuf::from("/custom/runs"));
    }
}
