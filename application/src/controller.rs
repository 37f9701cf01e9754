//! The workflow controller: owns the phase machine and drives stages.
//!
//! One run is a strict alternation of stage work and committed state:
//! the controller invokes a stage, applies the returned delta, persists,
//! then routes. Stage boundaries (and atomic-task boundaries during
//! implementation) are also the persistence and cancellation checkpoints,
//! so a resumed or restarted run continues from the last committed step.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use planwright_domain::{Message, WorkflowPhase, WorkflowState};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::WorkflowConfig;
use crate::error::{StageError, WorkflowError};
use crate::ports::diff_applier::DiffApplier;
use crate::ports::event_publisher::{ChannelKey, EventPublisher, StageEmitter};
use crate::ports::file_context::FileContext;
use crate::ports::llm_gateway::LlmGateway;
use crate::ports::state_store::StateStore;
use crate::stages::human_gate::HumanGateStage;
use crate::stages::implementation::ImplementationStage;
use crate::stages::planning::PlanningStage;
use crate::stages::StageOutput;
use crate::suspension::{ResumeToken, Suspension};

/// How a controller call ended.
#[derive(Debug)]
pub enum WorkflowOutcome {
    /// The run is parked at the human gate; present the prompt, keep the
    /// token, resume with the reply.
    Suspended(Suspension),
    /// The run walked the whole plan. `state.failed_atomics` lists any
    /// edits that failed after retry.
    Completed { state: WorkflowState },
    /// The run hit an unrecoverable error.
    Failed { error: String, state: WorkflowState },
}

/// Decide the next phase from committed state. Pure routing; all the
/// inputs are in the state itself.
///
/// An `AwaitingHuman` state with no recorded decision routes back toward
/// planning; callers log that as a policy decision.
pub fn advance(state: &WorkflowState) -> WorkflowPhase {
    match state.phase {
        WorkflowPhase::Planning => WorkflowPhase::AwaitingHuman,
        WorkflowPhase::AwaitingHuman => match state.plan_approved {
            Some(true) => WorkflowPhase::Implementing,
            Some(false) => WorkflowPhase::Revising,
            None => WorkflowPhase::Revising,
        },
        WorkflowPhase::Revising => WorkflowPhase::Planning,
        WorkflowPhase::Implementing => {
            if state.implementation_complete() {
                WorkflowPhase::Done
            } else {
                WorkflowPhase::Implementing
            }
        }
        terminal => terminal,
    }
}

pub struct WorkflowController {
    planning: PlanningStage,
    gate: HumanGateStage,
    implementation: ImplementationStage,
    store: Arc<dyn StateStore>,
    publisher: Arc<dyn EventPublisher>,
    config: WorkflowConfig,
    /// Runs currently being driven by this controller. One writer per run.
    active: Mutex<HashSet<ChannelKey>>,
    cancellation: Option<CancellationToken>,
}

impl WorkflowController {
    pub fn new(
        gateway: Arc<dyn LlmGateway>,
        applier: Arc<dyn DiffApplier>,
        files: Arc<dyn FileContext>,
        store: Arc<dyn StateStore>,
        publisher: Arc<dyn EventPublisher>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            planning: PlanningStage::new(gateway.clone(), config.clone()),
            gate: HumanGateStage::new(config.clone()),
            implementation: ImplementationStage::new(gateway, applier, files),
            store,
            publisher,
            config,
            active: Mutex::new(HashSet::new()),
            cancellation: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Start a fresh run for `key` and drive it until it suspends,
    /// completes, or fails.
    pub async fn start(
        &self,
        key: &ChannelKey,
        request: &str,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let _guard = self.acquire(key)?;

        if let Some(existing) = self.store.load(key).await? {
            if !existing.phase.is_terminal() {
                return Err(WorkflowError::AlreadyActive(key.channel_name()));
            }
        }

        info!(channel = %key.channel_name(), "starting workflow run");
        let mut state = WorkflowState::new(self.config.working_dir.clone());
        state.append_message(Message::note(format!("Request: {request}")));
        state.append_message(Message::research(format!("User request: {request}")));
        self.store.save(key, &state).await?;

        self.drive(key, state).await
    }

    /// Resume the suspended run identified by `token` with the human's
    /// reply, and drive it until it suspends again, completes, or fails.
    pub async fn resume(
        &self,
        token: &ResumeToken,
        reply: &str,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let key = token.channel_key();
        let _guard = self.acquire(&key)?;

        let mut state = self
            .store
            .load(&key)
            .await?
            .ok_or_else(|| WorkflowError::NoSuchRun(token.encode()))?;

        if state.phase != WorkflowPhase::AwaitingHuman {
            return Err(WorkflowError::NotSuspended(state.phase.as_str().to_string()));
        }

        info!(channel = %key.channel_name(), "resuming workflow run");
        let emitter = self.emitter(&key, "human_gate");
        let output = self.gate.resolve(reply, &emitter);
        self.commit(&key, &mut state, output).await?;

        let next = advance(&state);
        if state.plan_approved.is_none() {
            warn!(
                channel = %key.channel_name(),
                "no decision recorded after gate resolution, routing back to planning"
            );
        }
        if let Err(e) = state.transition_to(next) {
            return self.fail_run(&key, state, e.to_string()).await;
        }
        self.store.save(&key, &state).await?;

        self.drive(&key, state).await
    }

    async fn drive(
        &self,
        key: &ChannelKey,
        mut state: WorkflowState,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let workflow_emitter = self.emitter(key, "workflow");
        // One emitter for the whole implementation walk, so its events
        // stay ordered across atomic-task calls.
        let implementation_emitter = self.emitter(key, "implementation");

        loop {
            self.check_cancelled()?;

            match state.phase {
                WorkflowPhase::Planning => {
                    if state.revision_count > self.config.max_revisions {
                        let error =
                            WorkflowError::RevisionLimitExceeded(self.config.max_revisions);
                        return self.fail_run(key, state, error.to_string()).await;
                    }

                    let emitter = self.emitter(key, "planning");
                    match self.planning.run(&state, &emitter).await {
                        Ok(output) => {
                            self.commit(key, &mut state, output).await?;
                        }
                        Err(StageError::Cancelled) => return Err(WorkflowError::Cancelled),
                        Err(e) => return self.fail_run(key, state, e.to_string()).await,
                    }

                    if let Err(e) = state.transition_to(advance(&state)) {
                        return self.fail_run(key, state, e.to_string()).await;
                    }
                    self.store.save(key, &state).await?;
                    workflow_emitter.emit("suspending for human review");
                }
                WorkflowPhase::AwaitingHuman => {
                    // Suspend: hand the rendered plan and the token back.
                    let Some(plan) = state.plan.as_ref() else {
                        return self
                            .fail_run(key, state, "suspended without a plan".to_string())
                            .await;
                    };
                    let prompt = self.gate.render(plan);
                    let token = ResumeToken::new(&key.user_id, &key.run_id)?;
                    return Ok(WorkflowOutcome::Suspended(Suspension { token, prompt }));
                }
                WorkflowPhase::Revising => {
                    workflow_emitter.emit(format!(
                        "revision {} requested, replanning",
                        state.revision_count
                    ));
                    if let Err(e) = state.transition_to(advance(&state)) {
                        return self.fail_run(key, state, e.to_string()).await;
                    }
                    self.store.save(key, &state).await?;
                }
                WorkflowPhase::Implementing => {
                    if state.implementation_complete() {
                        if let Err(e) = state.transition_to(advance(&state)) {
                            return self.fail_run(key, state, e.to_string()).await;
                        }
                        self.store.save(key, &state).await?;
                        self.store.archive(key).await?;
                        workflow_emitter.emit(format!(
                            "run complete: {} edit(s) failed",
                            state.failed_atomics.len()
                        ));
                        info!(
                            channel = %key.channel_name(),
                            failed = state.failed_atomics.len(),
                            "workflow run complete"
                        );
                        return Ok(WorkflowOutcome::Completed { state });
                    }

                    match self
                        .implementation
                        .run_next(&state, &implementation_emitter)
                        .await
                    {
                        Ok(output) => {
                            self.commit(key, &mut state, output).await?;
                        }
                        Err(StageError::Cancelled) => return Err(WorkflowError::Cancelled),
                        Err(e) => return self.fail_run(key, state, e.to_string()).await,
                    }
                }
                WorkflowPhase::Done => {
                    return Ok(WorkflowOutcome::Completed { state });
                }
                WorkflowPhase::Failed => {
                    let error = state.error.clone().unwrap_or_default();
                    return Ok(WorkflowOutcome::Failed { error, state });
                }
            }
        }
    }

    /// Apply a stage's output to the state and persist, as one unit.
    /// The delta applies first so a scratchpad reset does not erase the
    /// stage's own messages.
    async fn commit(
        &self,
        key: &ChannelKey,
        state: &mut WorkflowState,
        output: StageOutput,
    ) -> Result<(), WorkflowError> {
        output.delta.apply(state);
        for message in output.messages {
            state.append_message(message);
        }
        self.store.save(key, state).await?;
        Ok(())
    }

    async fn fail_run(
        &self,
        key: &ChannelKey,
        mut state: WorkflowState,
        error: String,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        warn!(channel = %key.channel_name(), %error, "workflow run failed");
        state.fail(error.clone());
        self.store.save(key, &state).await?;
        self.emitter(key, "workflow")
            .emit(format!("run failed: {error}"));
        Ok(WorkflowOutcome::Failed { error, state })
    }

    fn emitter<'a>(&'a self, key: &ChannelKey, stage_name: &'static str) -> StageEmitter<'a> {
        StageEmitter::new(&*self.publisher, key.clone(), stage_name)
    }

    fn check_cancelled(&self) -> Result<(), WorkflowError> {
        match &self.cancellation {
            Some(token) if token.is_cancelled() => Err(WorkflowError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Register `key` as actively driven. The guard releases it on drop,
    /// including on early return.
    fn acquire(&self, key: &ChannelKey) -> Result<RunGuard<'_>, WorkflowError> {
        let mut active = self.active.lock().unwrap();
        if !active.insert(key.clone()) {
            return Err(WorkflowError::AlreadyActive(key.channel_name()));
        }
        Ok(RunGuard {
            active: &self.active,
            key: key.clone(),
        })
    }
}

struct RunGuard<'a> {
    active: &'a Mutex<HashSet<ChannelKey>>,
    key: ChannelKey,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.active.lock().unwrap().remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AmbiguousReplyPolicy;
    use crate::ports::diff_applier::DiffApplyError;
    use crate::ports::llm_gateway::GatewayError;
    use crate::ports::state_store::InMemoryStateStore;
    use crate::testing::{RecordingPublisher, ScriptedApplier, ScriptedGateway, StaticFileContext};

    const PLAN_1X1: &str = r#"```plan
{"tasks": [{"file_path": "src/a.rs", "goal": "g", "atomic_tasks": [{"instruction": "a1"}]}]}
```"#;

    const PLAN_2X2: &str = r#"```plan
{"tasks": [
  {"file_path": "src/a.rs", "goal": "ga", "atomic_tasks": [{"instruction": "a1"}, {"instruction": "a2"}]},
  {"file_path": "src/b.rs", "goal": "gb", "atomic_tasks": [{"instruction": "b1"}, {"instruction": "b2"}]}
]}
```"#;

    const DIFF: &str = r#"{"original_snippet": "old", "change_instruction": "new"}"#;

    struct Harness {
        controller: WorkflowController,
        store: Arc<InMemoryStateStore>,
        publisher: Arc<RecordingPublisher>,
    }

    fn harness(
        gateway_responses: Vec<Result<String, GatewayError>>,
        applier_results: Vec<Result<(), DiffApplyError>>,
        config: WorkflowConfig,
    ) -> Harness {
        let store = Arc::new(InMemoryStateStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let files = StaticFileContext::new()
            .with_file("/work/src/a.rs", "old contents a")
            .with_file("/work/src/b.rs", "old contents b");
        let controller = WorkflowController::new(
            Arc::new(ScriptedGateway::new(gateway_responses)),
            Arc::new(ScriptedApplier::new(applier_results)),
            Arc::new(files),
            store.clone(),
            publisher.clone(),
            config.with_working_dir("/work"),
        );
        Harness {
            controller,
            store,
            publisher,
        }
    }

    fn ok_responses(responses: &[&str]) -> Vec<Result<String, GatewayError>> {
        responses.iter().map(|r| Ok(r.to_string())).collect()
    }

    fn key() -> ChannelKey {
        ChannelKey::new("alice", "run-1")
    }

    #[test]
    fn test_advance_routing() {
        let mut state = WorkflowState::new("/work");
        assert_eq!(advance(&state), WorkflowPhase::AwaitingHuman);

        state.phase = WorkflowPhase::AwaitingHuman;
        state.plan_approved = Some(true);
        assert_eq!(advance(&state), WorkflowPhase::Implementing);
        state.plan_approved = Some(false);
        assert_eq!(advance(&state), WorkflowPhase::Revising);
        state.plan_approved = None;
        assert_eq!(advance(&state), WorkflowPhase::Revising);

        state.phase = WorkflowPhase::Revising;
        assert_eq!(advance(&state), WorkflowPhase::Planning);

        state.phase = WorkflowPhase::Done;
        assert_eq!(advance(&state), WorkflowPhase::Done);
    }

    #[tokio::test]
    async fn test_start_suspends_with_rendered_plan() {
        let h = harness(ok_responses(&[PLAN_1X1]), vec![], WorkflowConfig::default());

        let outcome = h.controller.start(&key(), "add a thing").await.unwrap();
        let WorkflowOutcome::Suspended(suspension) = outcome else {
            panic!("expected suspension");
        };
        assert_eq!(suspension.token.encode(), "alice:run-1");
        assert!(suspension.prompt.contains("src/a.rs"));

        let stored = h.store.load(&key()).await.unwrap().unwrap();
        assert_eq!(stored.phase, WorkflowPhase::AwaitingHuman);
        assert!(stored.plan.is_some());
    }

    #[tokio::test]
    async fn test_approval_runs_to_completion() {
        let h = harness(
            ok_responses(&[PLAN_1X1, DIFF]),
            vec![Ok(())],
            WorkflowConfig::default(),
        );

        let outcome = h.controller.start(&key(), "add a thing").await.unwrap();
        let WorkflowOutcome::Suspended(suspension) = outcome else {
            panic!("expected suspension");
        };

        let outcome = h
            .controller
            .resume(&suspension.token, "Looks good, go ahead")
            .await
            .unwrap();
        let WorkflowOutcome::Completed { state } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(state.phase, WorkflowPhase::Done);
        assert!(state.failed_atomics.is_empty());

        // Terminal run is archived out of the active set
        assert!(h.store.load(&key()).await.unwrap().is_none());
        assert_eq!(h.store.archived_count(), 1);

        // Consumers saw planning, the gate decision, and implementation
        let stages = h.publisher.stage_names();
        assert!(stages.iter().any(|s| s == "planning"));
        assert!(stages.iter().any(|s| s == "human_gate"));
        assert!(stages.iter().any(|s| s == "implementation"));
    }

    #[tokio::test]
    async fn test_revision_cycle_replans_with_feedback() {
        let h = harness(
            ok_responses(&[PLAN_1X1, PLAN_2X2]),
            vec![],
            WorkflowConfig::default(),
        );

        let WorkflowOutcome::Suspended(first) =
            h.controller.start(&key(), "add a thing").await.unwrap()
        else {
            panic!("expected suspension");
        };

        let outcome = h
            .controller
            .resume(&first.token, "Can we split this across both modules?")
            .await
            .unwrap();
        let WorkflowOutcome::Suspended(second) = outcome else {
            panic!("expected a second suspension");
        };

        // The regenerated plan is the one rendered
        assert!(second.prompt.contains("src/b.rs"));

        let stored = h.store.load(&key()).await.unwrap().unwrap();
        assert_eq!(stored.revision_count, 1);
        assert_eq!(
            stored.human_feedback,
            "Can we split this across both modules?"
        );
        assert_eq!((stored.current_task_index, stored.current_atomic_index), (0, 0));
    }

    #[tokio::test]
    async fn test_partial_failure_completes_with_record() {
        // 2x2 plan; the second atomic of the first task fails twice.
        // Diff responses: a1, a2, a2 retry, b1, b2.
        let h = harness(
            ok_responses(&[PLAN_2X2, DIFF, DIFF, DIFF, DIFF, DIFF]),
            vec![
                Ok(()),
                Err(DiffApplyError::Failed("snippet not found".into())),
                Err(DiffApplyError::Failed("snippet not found".into())),
                Ok(()),
                Ok(()),
            ],
            WorkflowConfig::default(),
        );

        let WorkflowOutcome::Suspended(suspension) =
            h.controller.start(&key(), "do the thing").await.unwrap()
        else {
            panic!("expected suspension");
        };
        let outcome = h.controller.resume(&suspension.token, "ship it").await.unwrap();

        let WorkflowOutcome::Completed { state } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(state.failed_atomics.len(), 1);
        let failure = &state.failed_atomics[0];
        assert_eq!((failure.task_index, failure.atomic_index), (0, 1));
        assert_eq!(failure.file_path, "src/a.rs");
    }

    #[tokio::test]
    async fn test_unreadable_file_skips_task_and_continues() {
        // Plan names src/missing.rs which the file context cannot read,
        // then src/a.rs which succeeds.
        let plan = r#"```plan
{"tasks": [
  {"file_path": "src/missing.rs", "goal": "g", "atomic_tasks": [{"instruction": "m1"}, {"instruction": "m2"}]},
  {"file_path": "src/a.rs", "goal": "g", "atomic_tasks": [{"instruction": "a1"}]}
]}
```"#;
        let h = harness(
            ok_responses(&[plan, DIFF]),
            vec![Ok(())],
            WorkflowConfig::default(),
        );

        let WorkflowOutcome::Suspended(suspension) =
            h.controller.start(&key(), "do the thing").await.unwrap()
        else {
            panic!("expected suspension");
        };
        let outcome = h.controller.resume(&suspension.token, "yes").await.unwrap();

        let WorkflowOutcome::Completed { state } = outcome else {
            panic!("expected completion");
        };
        // One failure record for the skipped task, second task still ran
        assert_eq!(state.failed_atomics.len(), 1);
        assert_eq!(state.failed_atomics[0].file_path, "src/missing.rs");
    }

    #[tokio::test]
    async fn test_revision_limit_fails_the_run() {
        let h = harness(
            ok_responses(&[PLAN_1X1, PLAN_1X1]),
            vec![],
            WorkflowConfig::default().with_max_revisions(0),
        );

        let WorkflowOutcome::Suspended(suspension) =
            h.controller.start(&key(), "do the thing").await.unwrap()
        else {
            panic!("expected suspension");
        };
        let outcome = h
            .controller
            .resume(&suspension.token, "redo it")
            .await
            .unwrap();

        let WorkflowOutcome::Failed { error, state } = outcome else {
            panic!("expected failure");
        };
        assert!(error.contains("Revision limit"));
        assert_eq!(state.phase, WorkflowPhase::Failed);
    }

    #[tokio::test]
    async fn test_planning_failure_fails_the_run() {
        let h = harness(
            ok_responses(&["no plan here", "still no plan", "nope"]),
            vec![],
            WorkflowConfig::default(),
        );

        let outcome = h.controller.start(&key(), "do the thing").await.unwrap();
        let WorkflowOutcome::Failed { error, .. } = outcome else {
            panic!("expected failure");
        };
        assert!(error.contains("planning failed"));

        let stored = h.store.load(&key()).await.unwrap().unwrap();
        assert_eq!(stored.phase, WorkflowPhase::Failed);
    }

    #[tokio::test]
    async fn test_resume_unknown_token() {
        let h = harness(vec![], vec![], WorkflowConfig::default());
        let token = ResumeToken::new("nobody", "nothing").unwrap();
        let err = h.controller.resume(&token, "yes").await.unwrap_err();
        assert!(matches!(err, WorkflowError::NoSuchRun(_)));
    }

    #[tokio::test]
    async fn test_start_rejects_active_run() {
        let h = harness(ok_responses(&[PLAN_1X1]), vec![], WorkflowConfig::default());
        h.controller.start(&key(), "first").await.unwrap();

        let err = h.controller.start(&key(), "second").await.unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadyActive(_)));
    }

    #[tokio::test]
    async fn test_ambiguous_reply_resolves_by_policy() {
        let h = harness(
            ok_responses(&[PLAN_1X1, DIFF]),
            vec![Ok(())],
            WorkflowConfig::default().with_ambiguous_reply(AmbiguousReplyPolicy::Approve),
        );

        let WorkflowOutcome::Suspended(suspension) =
            h.controller.start(&key(), "do it now").await.unwrap()
        else {
            panic!("expected suspension");
        };
        // "hmm" carries no signal; policy approves
        let outcome = h.controller.resume(&suspension.token, "hmm").await.unwrap();
        assert!(matches!(outcome, WorkflowOutcome::Completed { .. }));
    }

    #[tokio::test]
    async fn test_cancellation_observed_at_boundary() {
        let token = CancellationToken::new();
        token.cancel();
        let store = Arc::new(InMemoryStateStore::new());
        let controller = WorkflowController::new(
            Arc::new(ScriptedGateway::replying(&[PLAN_1X1])),
            Arc::new(ScriptedApplier::succeeding()),
            Arc::new(StaticFileContext::new()),
            store,
            Arc::new(RecordingPublisher::new()),
            WorkflowConfig::default(),
        )
        .with_cancellation(token);

        let err = controller.start(&key(), "do it").await.unwrap_err();
        assert!(matches!(err, WorkflowError::Cancelled));
    }

    #[tokio::test]
    async fn test_suspension_survives_controller_restart() {
        let store = Arc::new(InMemoryStateStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let files = StaticFileContext::new().with_file("/work/src/a.rs", "old");

        let first = WorkflowController::new(
            Arc::new(ScriptedGateway::replying(&[PLAN_1X1])),
            Arc::new(ScriptedApplier::succeeding()),
            Arc::new(StaticFileContext::new().with_file("/work/src/a.rs", "old")),
            store.clone(),
            publisher.clone(),
            WorkflowConfig::default().with_working_dir("/work"),
        );
        let WorkflowOutcome::Suspended(suspension) =
            first.start(&key(), "do it").await.unwrap()
        else {
            panic!("expected suspension");
        };
        drop(first);

        // A fresh controller over the same store picks the run back up
        let second = WorkflowController::new(
            Arc::new(ScriptedGateway::replying(&[DIFF])),
            Arc::new(ScriptedApplier::succeeding()),
            Arc::new(files),
            store.clone(),
            publisher,
            WorkflowConfig::default().with_working_dir("/work"),
        );
        let token = ResumeToken::decode(&suspension.token.encode()).unwrap();
        let outcome = second.resume(&token, "approve").await.unwrap();
        assert!(matches!(outcome, WorkflowOutcome::Completed { .. }));
    }

    #[tokio::test]
    async fn test_events_ordered_within_each_stage() {
        let h = harness(
            ok_responses(&[PLAN_2X2, DIFF, DIFF, DIFF, DIFF]),
            vec![Ok(()), Ok(()), Ok(()), Ok(())],
            WorkflowConfig::default(),
        );

        let WorkflowOutcome::Suspended(suspension) =
            h.controller.start(&key(), "do it").await.unwrap()
        else {
            panic!("expected suspension");
        };
        h.controller.resume(&suspension.token, "lgtm").await.unwrap();

        let events = h.publisher.events.lock().unwrap();
        for stage in ["planning", "human_gate", "implementation", "workflow"] {
            let stamps: Vec<_> = events
                .iter()
                .filter(|e| e.stage_name == stage)
                .map(|e| e.timestamp)
                .collect();
            for pair in stamps.windows(2) {
                assert!(pair[1] >= pair[0], "events out of order in {stage}");
            }
        }
        assert!(events.iter().all(|e| e.user_id == "alice" && e.run_id == "run-1"));
    }
}
