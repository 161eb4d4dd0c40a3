//! Domain error types

use super::ids::{ParticipantId, SessionId, StageName};
use thiserror::Error;

/// Domain-level errors
///
/// Pure accessors surface these instead of falling back to defaults, since a
/// silent default would corrupt quorum math.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Participant {participant} has no state for stage '{stage}'")]
    MissingStageState {
        participant: ParticipantId,
        stage: StageName,
    },

    #[error("Participant {participant} already has state for stage '{stage}'")]
    StageAlreadyInitialized {
        participant: ParticipantId,
        stage: StageName,
    },

    #[error("Discussion queue is empty")]
    EmptyQueue,

    #[error("Transition for stage '{stage}' in session {session} was already fired")]
    DuplicateTransition { session: SessionId, stage: StageName },

    #[error("Unknown participant: {0}")]
    UnknownParticipant(ParticipantId),

    #[error("Participant already joined: {0}")]
    DuplicateParticipant(ParticipantId),

    #[error("Unknown stage: {0}")]
    UnknownStage(StageName),
}

impl DomainError {
    /// Whether the error means "not quorate yet" under the default policy
    pub fn is_missing_stage_state(&self) -> bool {
        matches!(self, DomainError::MissingStageState { .. })
    }
}
