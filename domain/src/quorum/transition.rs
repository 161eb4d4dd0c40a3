//! Idempotency ledger for stage transitions

use crate::core::error::DomainError;
use crate::core::ids::{SessionId, StageName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Idempotency token for one stage of one session
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TransitionKey {
    pub session: SessionId,
    pub stage: StageName,
}

impl TransitionKey {
    pub fn new(session: SessionId, stage: StageName) -> Self {
        Self { session, stage }
    }
}

impl std::fmt::Display for TransitionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.session, self.stage)
    }
}

/// Transition state for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitionState {
    /// No transition issued yet
    Pending,
    /// Transition issued; permanent
    Fired,
}

impl std::fmt::Display for TransitionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionState::Pending => write!(f, "Pending"),
            TransitionState::Fired => write!(f, "Fired"),
        }
    }
}

/// Records which keys have fired. Keys absent from the ledger are `Pending`.
#[derive(Debug, Clone, Default)]
pub struct TransitionLedger {
    fired: BTreeSet<TransitionKey>,
}

impl TransitionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, key: &TransitionKey) -> TransitionState {
        if self.fired.contains(key) {
            TransitionState::Fired
        } else {
            TransitionState::Pending
        }
    }

    /// Move `key` from `Pending` to `Fired`.
    ///
    /// A second call for the same key is rejected with
    /// [`DomainError::DuplicateTransition`]; there is no way back to
    /// `Pending`.
    pub fn fire(&mut self, key: TransitionKey) -> Result<(), DomainError> {
        if self.fired.contains(&key) {
            return Err(DomainError::DuplicateTransition {
                session: key.session,
                stage: key.stage,
            });
        }
        self.fired.insert(key);
        Ok(())
    }

    pub fn fired_count(&self) -> usize {
        self.fired.len()
    }
}
