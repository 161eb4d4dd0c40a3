//! Participant entity

use crate::core::error::DomainError;
use crate::core::ids::{ParticipantId, StageName};
use crate::stage::StageState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Display profile shown to other participants
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pronouns: Option<String>,
}

impl Profile {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A participant in a shared session (Entity)
///
/// Created when the participant joins and never removed during the session.
/// `stage_map` holds this participant's state for every stage it has been
/// initialised for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    id: ParticipantId,
    profile: Profile,
    current_stage_name: StageName,
    stage_map: BTreeMap<StageName, StageState>,
}

impl Participant {
    pub fn new(id: ParticipantId, profile: Profile, current_stage_name: StageName) -> Self {
        Self {
            id,
            profile,
            current_stage_name,
            stage_map: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// The stage this participant is currently working on
    pub fn current_stage_name(&self) -> &StageName {
        &self.current_stage_name
    }

    pub fn is_on_stage(&self, stage: &StageName) -> bool {
        &self.current_stage_name == stage
    }

    pub fn has_stage_state(&self, stage: &StageName) -> bool {
        self.stage_map.contains_key(stage)
    }

    /// This participant's state for `stage`
    pub fn stage_state(&self, stage: &StageName) -> Result<&StageState, DomainError> {
        self.stage_map
            .get(stage)
            .ok_or_else(|| DomainError::MissingStageState {
                participant: self.id.clone(),
                stage: stage.clone(),
            })
    }

    pub fn with_stage_state(mut self, stage: StageName, state: StageState) -> Self {
        self.stage_map.insert(stage, state);
        self
    }

    pub fn with_current_stage(mut self, stage: StageName) -> Self {
        self.current_stage_name = stage;
        self
    }
}
