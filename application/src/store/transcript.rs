//! Observer that mirrors structural commits into the transcript

use super::commit::{Change, Commit};
use crate::ports::store_observer::StoreObserver;
use crate::ports::transcript_logger::{TranscriptEvent, TranscriptLogger};
use serde_json::json;
use stagegate_domain::Session;
use std::sync::Arc;

/// Writes `participant_joined`, `stage_initialized` and
/// `participant_advanced` events.
///
/// Stage-state mutations are logged by the use cases that issue them, which
/// know whether a message or a readiness toggle was committed.
pub struct TranscriptObserver {
    logger: Arc<dyn TranscriptLogger>,
}

impl TranscriptObserver {
    pub fn new(logger: Arc<dyn TranscriptLogger>) -> Self {
        Self { logger }
    }
}

impl StoreObserver for TranscriptObserver {
    fn on_commit(&self, snapshot: &Session, commit: &Commit) {
        let event = match &commit.change {
            Change::Joined { stage } => TranscriptEvent::new(
                "participant_joined",
                json!({
                    "session": snapshot.id(),
                    "participant": commit.participant,
                    "stage": stage,
                    "version": commit.version,
                }),
            ),
            Change::StageInitialized { stage } => TranscriptEvent::new(
                "stage_initialized",
                json!({
                    "session": snapshot.id(),
                    "participant": commit.participant,
                    "stage": stage,
                    "version": commit.version,
                }),
            ),
            Change::Advanced { from, to } => TranscriptEvent::new(
                "participant_advanced",
                json!({
                    "session": snapshot.id(),
                    "participant": commit.participant,
                    "from": from,
                    "to": to,
                    "version": commit.version,
                }),
            ),
            Change::StageStateMutated { .. } => return,
        };
        self.logger.log(event);
    }
}
