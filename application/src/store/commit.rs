//! Commit records passed to observers

use serde::Serialize;
use stagegate_domain::{ParticipantId, StageName};

/// What a commit changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    /// A participant joined the session
    Joined { stage: StageName },
    /// A participant's state for a stage was created
    StageInitialized { stage: StageName },
    /// A participant's state for a stage was mutated
    StageStateMutated { stage: StageName },
    /// A participant moved to another stage
    Advanced { from: StageName, to: StageName },
}

impl Change {
    /// The stage whose quorum may have changed.
    ///
    /// For `Advanced` that is the stage left behind, whose cohort shrank.
    /// A join only grows a cohort, so it never makes one quorate.
    pub fn affected_stage(&self) -> Option<&StageName> {
        match self {
            Change::StageInitialized { stage } | Change::StageStateMutated { stage } => {
                Some(stage)
            }
            Change::Advanced { from, .. } => Some(from),
            Change::Joined { .. } => None,
        }
    }
}

/// One committed mutation of one participant cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Commit {
    /// Session version after this commit
    pub version: u64,
    pub participant: ParticipantId,
    pub change: Change,
}
