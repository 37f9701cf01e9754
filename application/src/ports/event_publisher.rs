//! Progress event port.
//!
//! Stages report progress through an [`EventPublisher`]; where the events
//! go (an async channel, a log, nowhere) is an adapter concern. The
//! contract is strict on two points:
//!
//! - `publish` never blocks and never fails the caller. Event delivery is
//!   best-effort; a lost event is logged by the adapter and the workflow
//!   continues.
//! - Events from one stage instance carry non-decreasing timestamps, so a
//!   consumer sorting by timestamp sees them in emission order. The
//!   [`StageEmitter`] enforces this clamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Identifies one run's event stream: the `(user_id, run_id)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelKey {
    pub user_id: String,
    pub run_id: String,
}

impl ChannelKey {
    pub fn new(user_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            run_id: run_id.into(),
        }
    }

    /// The channel name consumers subscribe to.
    pub fn channel_name(&self) -> String {
        format!("agent_events:{}:{}", self.user_id, self.run_id)
    }
}

/// Optional per-event details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Seconds the reported operation took
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// Task the event concerns (a file path during implementation)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
}

impl EventMetadata {
    pub fn with_model(model_name: impl Into<String>) -> Self {
        Self {
            model_name: Some(model_name.into()),
            ..Default::default()
        }
    }

    pub fn task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    pub fn duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }
}

/// One progress event as delivered to consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEvent {
    pub user_id: String,
    pub run_id: String,
    pub stage_name: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: EventMetadata,
}

/// Port for delivering progress events to the run's channel.
pub trait EventPublisher: Send + Sync {
    /// Deliver `event` to the stream identified by `key`. Must not block
    /// and must not panic, whatever thread it is called from.
    fn publish(&self, key: &ChannelKey, event: AgentEvent);
}

/// Publisher that discards everything. The default when nobody listens.
pub struct NoEventPublisher;

impl EventPublisher for NoEventPublisher {
    fn publish(&self, _key: &ChannelKey, _event: AgentEvent) {}
}

/// Per-stage handle that stamps and orders events before publishing.
///
/// One emitter is created per stage invocation. It remembers the timestamp
/// of the last event it emitted and clamps the next one to be at least as
/// large, so clock adjustments cannot reorder a stage's events.
pub struct StageEmitter<'a> {
    publisher: &'a dyn EventPublisher,
    key: ChannelKey,
    stage_name: &'static str,
    last_timestamp: Mutex<DateTime<Utc>>,
}

impl<'a> StageEmitter<'a> {
    pub fn new(publisher: &'a dyn EventPublisher, key: ChannelKey, stage_name: &'static str) -> Self {
        Self {
            publisher,
            key,
            stage_name,
            last_timestamp: Mutex::new(Utc::now()),
        }
    }

    pub fn stage_name(&self) -> &'static str {
        self.stage_name
    }

    pub fn emit(&self, text: impl Into<String>) {
        self.emit_with(text, EventMetadata::default());
    }

    pub fn emit_with(&self, text: impl Into<String>, metadata: EventMetadata) {
        let timestamp = self.next_timestamp();
        let event = AgentEvent {
            user_id: self.key.user_id.clone(),
            run_id: self.key.run_id.clone(),
            stage_name: self.stage_name.to_string(),
            text: text.into(),
            timestamp,
            metadata,
        };
        self.publisher.publish(&self.key, event);
    }

    fn next_timestamp(&self) -> DateTime<Utc> {
        let mut last = self.last_timestamp.lock().unwrap();
        let now = Utc::now();
        let stamped = if now > *last { now } else { *last };
        *last = stamped;
        stamped
    }
}
