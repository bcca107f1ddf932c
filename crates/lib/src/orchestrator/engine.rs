//! The orchestration engine: drives one run through classify -> (enrich) ->
//! send. Each step is individually retried and its outcome persisted before
//! the next step starts, so a restarted process picks up where the old one
//! stopped. The degraded outcome on Failed is silence; it is logged, never
//! surfaced to the webhook caller (that response went out long ago).

use super::run::{RetryPolicy, RunRecord, RunState};
use super::store::RunStore;
use crate::channels::{CandidateSource, ReplyTransport};
use crate::dispatch::{self, Directive, ReplyAction};
use std::sync::Arc;

pub struct Orchestrator {
    store: Arc<RunStore>,
    transport: Arc<dyn ReplyTransport>,
    candidates: Arc<dyn CandidateSource>,
    policy: RetryPolicy,
}

impl Orchestrator {
    pub fn new(
        store: Arc<RunStore>,
        transport: Arc<dyn ReplyTransport>,
        candidates: Arc<dyn CandidateSource>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            transport,
            candidates,
            policy,
        }
    }

    /// Drive a run to a terminal state. Accepts both fresh runs (Dispatching)
    /// and runs resumed from disk (Sending, with the action already recorded).
    pub async fn drive(&self, mut run: RunRecord) -> RunState {
        log::debug!("run {}: driving from {:?}", run.id, run.state);
        if run.state == RunState::Dispatching {
            match self.dispatch_step(&mut run).await {
                Ok(action) => {
                    run.action = Some(action);
                    run.state = RunState::Sending;
                    run.attempts = 0;
                    run.last_error = None;
                    self.persist(&run).await;
                }
                Err(reason) => return self.fail(run, reason).await,
            }
        }
        if run.state == RunState::Sending {
            return match self.send_step(&mut run).await {
                Ok(()) => self.complete(run).await,
                Err(reason) => self.fail(run, reason).await,
            };
        }
        run.state
    }

    /// Classify the event; when enrichment is required, run it as its own
    /// retryable step before entering Sending.
    async fn dispatch_step(&self, run: &mut RunRecord) -> Result<ReplyAction, String> {
        match dispatch::classify(&run.event) {
            Directive::Reply(action) => Ok(action),
            Directive::Enrich { lat, lng } => {
                let mut attempt = run.attempts;
                loop {
                    attempt += 1;
                    match self.candidates.lookup(lat, lng).await {
                        Ok(list) => return Ok(dispatch::ranked_quick_reply(&list)),
                        Err(e) => {
                            run.attempts = attempt;
                            run.last_error = Some(e.to_string());
                            if attempt >= self.policy.max_attempts {
                                return Err(format!(
                                    "enrichment unavailable after {} attempt(s): {}",
                                    attempt, e
                                ));
                            }
                            log::warn!("run {}: lookup attempt {} failed: {}", run.id, attempt, e);
                            self.persist(run).await;
                            tokio::time::sleep(self.policy.delay).await;
                        }
                    }
                }
            }
        }
    }

    /// Send the recorded action, retrying retriable failures with the fixed
    /// delay. Non-retriable failures end the run without consuming a retry.
    async fn send_step(&self, run: &mut RunRecord) -> Result<(), String> {
        let action = match run.action.clone() {
            Some(action) => action,
            None => return Err("sending state without a recorded action".to_string()),
        };
        let mut attempt = run.attempts;
        loop {
            attempt += 1;
            match self.transport.send_reply(&run.reply_token, &action).await {
                Ok(()) => {
                    run.attempts = attempt;
                    return Ok(());
                }
                Err(e) if !e.retriable() => {
                    run.attempts = attempt;
                    return Err(format!("reply rejected: {}", e));
                }
                Err(e) => {
                    run.attempts = attempt;
                    run.last_error = Some(e.to_string());
                    if attempt >= self.policy.max_attempts {
                        return Err(format!(
                            "reply delivery failed after {} attempt(s): {}",
                            attempt, e
                        ));
                    }
                    log::warn!("run {}: send attempt {} failed: {}", run.id, attempt, e);
                    self.persist(run).await;
                    tokio::time::sleep(self.policy.delay).await;
                }
            }
        }
    }

    async fn complete(&self, mut run: RunRecord) -> RunState {
        run.state = RunState::Completed;
        run.last_error = None;
        log::info!("run {}: completed after {} attempt(s)", run.id, run.attempts);
        self.discard(&run).await;
        RunState::Completed
    }

    async fn fail(&self, mut run: RunRecord, reason: String) -> RunState {
        run.state = RunState::Failed;
        log::warn!("run {}: failed: {}", run.id, reason);
        run.last_error = Some(reason);
        self.discard(&run).await;
        RunState::Failed
    }

    /// Durability failures must not take the run down with them; the reply
    /// pipeline keeps going and the gap is logged.
    async fn persist(&self, run: &RunRecord) {
        if let Err(e) = self.store.save(run).await {
            log::warn!("run {}: persisting record failed: {}", run.id, e);
        }
    }

    /// Terminal records are discarded from the store.
    async fn discard(&self, run: &RunRecord) {
        if let Err(e) = self.store.remove(&run.id).await {
            log::warn!("run {}: removing record failed: {}", run.id, e);
        }
    }
}
