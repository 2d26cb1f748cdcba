//! Import coordinator state machine
//!
//! `Running → {Draining, Failed} → Done`
//!
//! - **Running**: records are being pulled from the parser and dispatched
//! - **Draining**: the stream ended cleanly, waiting for card tasks to finish
//! - **Failed**: a fatal error was recorded; the stream is drained without dispatch
//! - **Done**: all tasks joined, result decided

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Import workflow state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImportState {
    Running,
    Draining,
    Failed,
    Done,
}

impl ImportState {
    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(self, next: ImportState) -> bool {
        matches!(
            (self, next),
            (ImportState::Running, ImportState::Draining)
                | (ImportState::Running, ImportState::Failed)
                | (ImportState::Draining, ImportState::Failed)
                | (ImportState::Draining, ImportState::Done)
                | (ImportState::Failed, ImportState::Done)
        )
    }
}

/// One import run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSession {
    /// Unique session identifier, attached to every log line of the run
    pub session_id: Uuid,

    /// Current workflow state
    pub state: ImportState,

    /// Session start time
    pub started_at: DateTime<Utc>,

    /// Session end time (once Done)
    pub ended_at: Option<DateTime<Utc>>,
}

impl ImportSession {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            state: ImportState::Running,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Transition to new state, logging it
    ///
    /// Illegal transitions are logged at debug level and ignored.
    pub fn transition_to(&mut self, new_state: ImportState) {
        if !self.state.can_transition_to(new_state) {
            tracing::debug!(
                session_id = %self.session_id,
                from = ?self.state,
                to = ?new_state,
                "Ignoring illegal import state transition"
            );
            return;
        }

        let old_state = std::mem::replace(&mut self.state, new_state);
        if new_state == ImportState::Done {
            self.ended_at = Some(Utc::now());
        }

        tracing::info!(
            session_id = %self.session_id,
            from = ?old_state,
            to = ?new_state,
            "Import state transition"
        );
    }

    /// Elapsed milliseconds since start (or until end)
    pub fn elapsed_ms(&self) -> i64 {
        let end = self.ended_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds()
    }
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new()
    }
}
