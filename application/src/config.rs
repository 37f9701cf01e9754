//! Workflow configuration.

use planwright_domain::Decision;
use serde::{Deserialize, Serialize};

/// What an ambiguous human reply resolves to.
///
/// Ambiguous replies are resolved by this policy rather than re-prompting;
/// every such resolution is logged as a policy decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmbiguousReplyPolicy {
    #[default]
    Approve,
    Revise,
}

impl AmbiguousReplyPolicy {
    pub fn decision(self) -> Decision {
        match self {
            Self::Approve => Decision::Approve,
            Self::Revise => Decision::Revise,
        }
    }
}

/// Tunable behavior for a [`WorkflowController`](crate::controller::WorkflowController).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Planning attempts before the run fails
    pub max_plan_retries: usize,
    /// Revision cycles before the run fails
    pub max_revisions: usize,
    /// Resolution policy for ambiguous review replies
    pub ambiguous_reply: AmbiguousReplyPolicy,
    /// Default working directory for new runs
    pub working_dir: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_plan_retries: 3,
            max_revisions: 10,
            ambiguous_reply: AmbiguousReplyPolicy::default(),
            working_dir: ".".to_string(),
        }
    }
}

impl WorkflowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_plan_retries(mut self, retries: usize) -> Self {
        self.max_plan_retries = retries;
        self
    }

    pub fn with_max_revisions(mut self, revisions: usize) -> Self {
        self.max_revisions = revisions;
        self
    }

    pub fn with_ambiguous_reply(mut self, policy: AmbiguousReplyPolicy) -> Self {
        self.ambiguous_reply = policy;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = dir.into();
        self
    }
}
