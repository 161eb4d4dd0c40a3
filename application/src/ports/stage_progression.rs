//! Stage progression port
//!
//! Invoked by the
//! [`StageTransitionController`](crate::use_cases::stage_transition::StageTransitionController)
//! exactly once per (session, stage) when the cohort reaches quorum.

use stagegate_domain::{ParticipantId, StageName, TransitionKey};
use thiserror::Error;

/// Errors reported by a progression adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProgressionError {
    #[error("Stage '{0}' is the last stage of the session")]
    NoNextStage(StageName),

    #[error("Failed to advance participants: {0}")]
    AdvanceFailed(String),
}

/// Port for advancing a session past a stage ("next step").
pub trait StageProgression: Send + Sync {
    /// Advance `cohort` past the stage in `key`.
    ///
    /// Called synchronously from the commit that produced quorum. Adapters
    /// may write back to the document store.
    fn next_step(&self, key: &TransitionKey, cohort: &[ParticipantId])
    -> Result<(), ProgressionError>;
}

/// Progression that does nothing, for callers that only need the quorum signal.
pub struct NoProgression;

impl StageProgression for NoProgression {
    fn next_step(
        &self,
        _key: &TransitionKey,
        _cohort: &[ParticipantId],
    ) -> Result<(), ProgressionError> {
        Ok(())
    }
}
