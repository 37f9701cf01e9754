//! LLM gateway that shells out to a local inference command.
//!
//! The prompt goes to the child's stdin; stdout is the completion. This
//! keeps provider plumbing out of the workflow and lets any CLI-fronted
//! model serve as the backend.

use std::process::Stdio;

use async_trait::async_trait;
use planwright_application::ports::llm_gateway::{GatewayError, LlmGateway};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

pub struct CommandLlmGateway {
    program: String,
    args: Vec<String>,
    model_name: String,
}

impl CommandLlmGateway {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            model_name: model_name.into(),
        }
    }
}

#[async_trait]
impl LlmGateway for CommandLlmGateway {
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError> {
        debug!(program = %self.program, prompt_len = prompt.len(), "invoking inference command");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| GatewayError::Unavailable(format!("{}: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(prompt.as_bytes())
                .await
                .map_err(|e| GatewayError::RequestFailed(format!("writing prompt: {e}")))?;
            // Close stdin so the child sees EOF
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| GatewayError::RequestFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GatewayError::RequestFailed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|e| GatewayError::RequestFailed(format!("non-UTF-8 output: {e}")))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
