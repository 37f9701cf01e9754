//! Suspension tokens.
//!
//! When the human gate suspends a run, the caller gets back an opaque
//! token and the rendered review prompt. Presenting the token with a
//! reply resumes exactly that run. The token encodes the `(user_id,
//! run_id)` pair; callers treat it as opaque.

use crate::error::WorkflowError;
use crate::ports::event_publisher::ChannelKey;

/// Token identifying a suspended run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeToken {
    user_id: String,
    run_id: String,
}

impl ResumeToken {
    /// Build a token. Neither component may be empty or contain `:`,
    /// which the encoding reserves as the separator.
    pub fn new(user_id: impl Into<String>, run_id: impl Into<String>) -> Result<Self, WorkflowError> {
        let user_id = user_id.into();
        let run_id = run_id.into();
        for part in [&user_id, &run_id] {
            if part.is_empty() || part.contains(':') {
                return Err(WorkflowError::InvalidToken(format!(
                    "identifier {part:?} is empty or contains ':'"
                )));
            }
        }
        Ok(Self { user_id, run_id })
    }

    /// Parse a token previously produced by [`ResumeToken::encode`].
    pub fn decode(token: &str) -> Result<Self, WorkflowError> {
        match token.split_once(':') {
            Some((user_id, run_id)) => Self::new(user_id, run_id),
            None => Err(WorkflowError::InvalidToken(token.to_string())),
        }
    }

    pub fn encode(&self) -> String {
        format!("{}:{}", self.user_id, self.run_id)
    }

    pub fn channel_key(&self) -> ChannelKey {
        ChannelKey::new(&self.user_id, &self.run_id)
    }
}

impl std::fmt::Display for ResumeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

/// What the caller receives when a run suspends for review.
#[derive(Debug, Clone)]
pub struct Suspension {
    pub token: ResumeToken,
    /// Deterministic, human-readable rendering of the plan
    pub prompt: String,
}
