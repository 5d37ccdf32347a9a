use std::fmt;
use std::path::PathBuf;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::index::Divider;

/// Lifecycle of one submitted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl SessionState {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn can_move_to(self, next: SessionState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Pending, Self::Failed)
                | (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Failed)
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One document's background run: where its (temporary) source lives and
/// how it should be indexed.
#[derive(Debug, Clone)]
pub struct ExtractionSession {
    pub id: Uuid,
    pub source: PathBuf,
    pub prompt: Option<String>,
    pub divider: Option<Divider>,
    state: SessionState,
}

impl ExtractionSession {
    pub fn new(source: impl Into<PathBuf>, prompt: Option<String>, divider: Option<Divider>) -> Self {
        Self::with_id(Uuid::new_v4(), source, prompt, divider)
    }

    pub fn with_id(
        id: Uuid,
        source: impl Into<PathBuf>,
        prompt: Option<String>,
        divider: Option<Divider>,
    ) -> Self {
        Self {
            id,
            source: source.into(),
            prompt,
            divider,
            state: SessionState::Pending,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Moves to `next`; returns false and leaves the state untouched if the
    /// transition isn't allowed.
    pub fn transition(&mut self, next: SessionState) -> bool {
        if !self.state.can_move_to(next) {
            tracing::warn!(session_id = %self.id, from = %self.state, to = %next, "rejected session transition");
            return false;
        }
        self.state = next;
        true
    }
}

/// Last known state of every session, for callers that poll instead of
/// subscribing.
///
/// Entries stay until [`prune_finished`](SessionRegistry::prune_finished) is
/// called, so a long-lived queue should prune once results are collected.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    states: DashMap<Uuid, SessionState>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, session_id: Uuid, state: SessionState) {
        self.states.insert(session_id, state);
    }

    pub fn state(&self, session_id: Uuid) -> Option<SessionState> {
        self.states.get(&session_id).map(|entry| *entry.value())
    }

    /// Forgets every completed or failed session; returns how many went.
    pub fn prune_finished(&self) -> usize {
        let before = self.states.len();
        self.states.retain(|_, state| !state.is_finished());
        before - self.states.len()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
