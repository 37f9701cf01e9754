//! Diff applier that rewrites the located snippet through the LLM gateway.
//!
//! The instruction names an exact snippet and describes the change; the
//! gateway produces the replacement text, and the file is spliced and
//! rewritten atomically. Only the first occurrence of the snippet is
//! replaced.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use planwright_application::ports::diff_applier::{DiffApplier, DiffApplyError};
use planwright_application::ports::llm_gateway::LlmGateway;
use planwright_domain::DiffInstruction;
use tracing::debug;

pub struct GatewayDiffApplier {
    gateway: Arc<dyn LlmGateway>,
}

impl GatewayDiffApplier {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self { gateway }
    }

    fn build_prompt(diff: &DiffInstruction) -> String {
        format!(
            "Rewrite the following code snippet.\n\nSnippet:\n{}\n\nChange: {}\n\n\
             Respond with the rewritten snippet only, no fences, no commentary.",
            diff.original_snippet, diff.change_instruction
        )
    }

    /// Models wrap answers in code fences despite instructions; strip one
    /// outer fence if present.
    fn strip_fence(response: &str) -> &str {
        let trimmed = response.trim();
        let Some(rest) = trimmed.strip_prefix("```") else {
            return trimmed;
        };
        let Some(body) = rest.strip_suffix("```") else {
            return trimmed;
        };
        // Drop a language tag on the opening fence line
        match body.split_once('\n') {
            Some((_lang, code)) => code.trim_end(),
            None => body.trim(),
        }
    }
}

#[async_trait]
impl DiffApplier for GatewayDiffApplier {
    async fn apply(&self, file_path: &Path, diff: &DiffInstruction) -> Result<(), DiffApplyError> {
        if diff.original_snippet.trim().is_empty() {
            return Err(DiffApplyError::Failed("empty original snippet".to_string()));
        }

        let contents = tokio::fs::read_to_string(file_path)
            .await
            .map_err(|e| DiffApplyError::Failed(format!("cannot read {}: {e}", file_path.display())))?;

        if !contents.contains(&diff.original_snippet) {
            return Err(DiffApplyError::Failed(format!(
                "snippet not found in {}",
                file_path.display()
            )));
        }

        let response = self
            .gateway
            .complete(&Self::build_prompt(diff))
            .await
            .map_err(|e| DiffApplyError::Failed(format!("rewrite call failed: {e}")))?;
        let replacement = Self::strip_fence(&response);

        let updated = contents.replacen(&diff.original_snippet, replacement, 1);

        let tmp = file_path.with_extension("planwright.tmp");
        tokio::fs::write(&tmp, &updated)
            .await
            .map_err(|e| DiffApplyError::Failed(format!("cannot write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, file_path)
            .await
            .map_err(|e| DiffApplyError::Failed(format!("cannot replace {}: {e}", file_path.display())))?;

        debug!(file = %file_path.display(), "edit applied");
        Ok(())
    }
}
