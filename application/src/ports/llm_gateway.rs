//! LLM gateway port.
//!
//! Deliberately narrow: stages send a complete prompt and receive a
//! complete response. Provider choice, streaming, and session management
//! are adapter concerns.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from the LLM gateway
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Gateway unavailable: {0}")]
    Unavailable(String),
}

/// Port for model inference.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send a prompt and wait for the full completion.
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError>;

    /// Name of the backing model, for event metadata.
    fn model_name(&self) -> &str {
        "unknown"
    }
}
