//! Session domain entity

use crate::core::error::DomainError;
use crate::core::ids::{ParticipantId, SessionId, StageName};
use crate::participant::Participant;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The per-session document shared by all participants (Entity)
///
/// Participants are keyed by id in a `BTreeMap`, so iteration is
/// deterministic. `version` increases by one on every committed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    stages: Vec<StageName>,
    participants: BTreeMap<ParticipantId, Participant>,
    version: u64,
}

impl Session {
    /// Create an empty session with an ordered list of stages
    pub fn new(id: SessionId, stages: Vec<StageName>) -> Self {
        Self {
            id,
            stages,
            participants: BTreeMap::new(),
            version: 0,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn stages(&self) -> &[StageName] {
        &self.stages
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn participant(&self, id: &ParticipantId) -> Result<&Participant, DomainError> {
        self.participants
            .get(id)
            .ok_or_else(|| DomainError::UnknownParticipant(id.clone()))
    }

    /// Every participant except `id`, in id order
    pub fn other_participants<'a>(
        &'a self,
        id: &'a ParticipantId,
    ) -> impl Iterator<Item = &'a Participant> + 'a {
        self.participants.values().filter(move |p| p.id() != id)
    }

    /// Whether every participant is working on the same stage as `id`
    pub fn everyone_reached_stage(&self, id: &ParticipantId) -> Result<bool, DomainError> {
        let stage = self.participant(id)?.current_stage_name();
        Ok(self.participants.values().all(|p| p.is_on_stage(stage)))
    }

    /// The stage following `stage` in the session's stage order
    pub fn next_stage(&self, stage: &StageName) -> Result<Option<&StageName>, DomainError> {
        let position = self
            .stages
            .iter()
            .position(|s| s == stage)
            .ok_or_else(|| DomainError::UnknownStage(stage.clone()))?;
        Ok(self.stages.get(position + 1))
    }

    /// Add a newly joined participant
    pub fn insert_participant(&mut self, participant: Participant) -> Result<(), DomainError> {
        if self.participants.contains_key(participant.id()) {
            return Err(DomainError::DuplicateParticipant(participant.id().clone()));
        }
        self.participants
            .insert(participant.id().clone(), participant);
        Ok(())
    }

    /// Replace an existing participant's record
    pub fn replace_participant(&mut self, participant: Participant) -> Result<(), DomainError> {
        match self.participants.get_mut(participant.id()) {
            Some(slot) => {
                *slot = participant;
                Ok(())
            }
            None => Err(DomainError::UnknownParticipant(participant.id().clone())),
        }
    }

    /// Advance the version counter after a commit
    pub fn bump_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }
}
