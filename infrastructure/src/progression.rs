//! Stage progression over the session's ordered stage list
//!
//! Implements the [`StageProgression`] port by writing back to the same
//! [`SharedDocumentStore`] the transition controller observes.

use stagegate_application::{ProgressionError, SharedDocumentStore, StageProgression};
use stagegate_domain::{ParticipantId, StageState, TransitionKey};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// Moves a fired cohort to the stage after the fired one.
///
/// Holds a weak handle: the store owns the controller that owns this adapter.
pub struct SessionStageProgression {
    store: Weak<SharedDocumentStore>,
}

impl SessionStageProgression {
    pub fn new(store: &Arc<SharedDocumentStore>) -> Self {
        Self {
            store: Arc::downgrade(store),
        }
    }
}

impl StageProgression for SessionStageProgression {
    fn next_step(
        &self,
        key: &TransitionKey,
        cohort: &[ParticipantId],
    ) -> Result<(), ProgressionError> {
        let store = self
            .store
            .upgrade()
            .ok_or_else(|| ProgressionError::AdvanceFailed("document store dropped".to_string()))?;

        let snapshot = store
            .read()
            .map_err(|e| ProgressionError::AdvanceFailed(e.to_string()))?;
        let next = snapshot
            .next_stage(&key.stage)
            .map_err(|e| ProgressionError::AdvanceFailed(e.to_string()))?
            .cloned()
            .ok_or_else(|| ProgressionError::NoNextStage(key.stage.clone()))?;

        let mut moved = 0;
        for participant in cohort {
            // A member may have been moved already by an earlier caller.
            let still_here = snapshot
                .participant(participant)
                .map(|p| p.is_on_stage(&key.stage))
                .unwrap_or(false);
            if !still_here {
                debug!(participant = %participant, stage = %key.stage, "Skipping member no longer on stage");
                continue;
            }

            store
                .advance(participant, &next, StageState::new())
                .map_err(|e| ProgressionError::AdvanceFailed(e.to_string()))?;
            moved += 1;
        }

        info!(key = %key, to = %next, moved, "Advanced cohort to next stage");
        Ok(())
    }
}
