//! Run records: one per accepted webhook delivery, persisted across steps.

use crate::dispatch::ReplyAction;
use crate::webhook::Event;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Orchestration state. Dispatching -> Sending -> Completed, with bounded
/// send retries and Failed on exhaustion or a non-retriable error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Dispatching,
    Sending,
    Completed,
    Failed,
}

impl RunState {
    /// Terminal states are never retried or resumed.
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Completed | RunState::Failed)
    }
}

/// One orchestration run. Owns the decoded event for its lifetime; the state,
/// recorded action, and attempt counter are persisted facts, written before
/// each transition so a restart resumes at the last incomplete step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub id: String,
    pub received_at: chrono::DateTime<chrono::Utc>,
    pub reply_token: String,
    pub event: Event,
    pub state: RunState,
    /// Recorded by the dispatch step; the send step replays it on resume
    /// without re-classifying.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ReplyAction>,
    /// Attempts consumed by the step currently in progress.
    #[serde(default)]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl RunRecord {
    /// New run for an accepted delivery, starting at Dispatching.
    pub fn new(event: Event) -> Self {
        Self {
            id: format!("run-{}", uuid::Uuid::new_v4()),
            received_at: chrono::Utc::now(),
            reply_token: event.reply_token.clone(),
            event,
            state: RunState::Dispatching,
            action: None,
            attempts: 0,
            last_error: None,
        }
    }
}

/// Fixed-delay retry for the enrich and send steps: no jitter, no backoff
/// growth. Injectable so tests run with zero delay.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}
