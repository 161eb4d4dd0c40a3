//! Identity port
//!
//! Resolves which participant the local client acts as and which stage it is
//! showing. The session/identity service lives outside this crate.

use stagegate_domain::{ParticipantId, StageName};

/// Port answering "who am I and which stage am I on".
pub trait IdentityPort: Send + Sync {
    /// The local participant and the stage it is working on
    fn participant_and_stage(&self) -> (ParticipantId, StageName);
}

/// Identity fixed at construction, for tests and the scenario runner.
#[derive(Debug, Clone)]
pub struct FixedIdentity {
    participant: ParticipantId,
    stage: StageName,
}

impl FixedIdentity {
    pub fn new(participant: impl Into<ParticipantId>, stage: impl Into<StageName>) -> Self {
        Self {
            participant: participant.into(),
            stage: stage.into(),
        }
    }
}

impl IdentityPort for FixedIdentity {
    fn participant_and_stage(&self) -> (ParticipantId, StageName) {
        (self.participant.clone(), self.stage.clone())
    }
}
