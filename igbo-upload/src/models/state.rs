//! Submission state machine
//!
//! IDLE → AWAITING_UPLOAD → CONVERTING → READY_TO_UPLOAD → FETCHING → MERGING → PUBLISHING → DONE
//!
//! FAILED is reachable from CONVERTING, READY_TO_UPLOAD (blank transcript),
//! FETCHING, MERGING and PUBLISHING. PUBLISHING may return to FETCHING when
//! the remote moved and the append is retried. DONE and FAILED lead back to IDLE.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionState {
    Idle,
    AwaitingUpload,
    Converting,
    ReadyToUpload,
    Fetching,
    Merging,
    Publishing,
    Done,
    Failed(String),
}

impl SubmissionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionState::Done | SubmissionState::Failed(_))
    }

    pub fn can_transition_to(&self, next: &SubmissionState) -> bool {
        use SubmissionState::*;
        matches!(
            (self, next),
            (Idle, AwaitingUpload)
                | (AwaitingUpload, Converting)
                | (Converting, ReadyToUpload)
                | (Converting, Failed(_))
                | (ReadyToUpload, Fetching)
                | (ReadyToUpload, Failed(_))
                | (Fetching, Merging)
                | (Fetching, Failed(_))
                | (Merging, Publishing)
                | (Merging, Failed(_))
                | (Publishing, Done)
                | (Publishing, Fetching)
                | (Publishing, Failed(_))
                | (Done, Idle)
                | (Failed(_), Idle)
        )
    }
}

#[derive(Debug, Error)]
#[error("Invalid submission state transition: {from:?} → {to:?}")]
pub struct InvalidTransition {
    pub from: SubmissionState,
    pub to: SubmissionState,
}

/// Recorded transition
#[derive(Debug, Clone, Serialize)]
pub struct StateTransition {
    pub from: SubmissionState,
    pub to: SubmissionState,
    pub at: DateTime<Utc>,
}

/// Tracks one submission through the state machine
#[derive(Debug, Clone)]
pub struct SubmissionTracker {
    id: Uuid,
    state: SubmissionState,
    history: Vec<StateTransition>,
}

impl Default for SubmissionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionTracker {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SubmissionState::Idle,
            history: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    pub fn advance(&mut self, next: SubmissionState) -> Result<(), InvalidTransition> {
        if !self.state.can_transition_to(&next) {
            return Err(InvalidTransition {
                from: self.state.clone(),
                to: next,
            });
        }

        tracing::debug!(submission_id = %self.id, from = ?self.state, to = ?next, "Submission state change");
        self.history.push(StateTransition {
            from: self.state.clone(),
            to: next.clone(),
            at: Utc::now(),
        });
        self.state = next;
        Ok(())
    }

    /// Move to FAILED if the current state allows it
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), InvalidTransition> {
        self.advance(SubmissionState::Failed(reason.into()))
    }
}
