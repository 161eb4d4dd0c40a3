//! Chat stage use case
//!
//! The contract a chat UI talks to: two mutation entry points
//! (`toggle_readiness`, `send_message`) and the derived reads. All writes go
//! through the [`SharedDocumentStore`], so registered observers (transition
//! controller, view publisher) see them before the call returns.

use super::shared::now_millis;
use super::views::ChatStageView;
use crate::config::CoordinationConfig;
use crate::ports::identity::IdentityPort;
use crate::ports::transcript_logger::{NoTranscriptLogger, TranscriptEvent, TranscriptLogger};
use crate::store::{SharedDocumentStore, StoreError};
use serde_json::json;
use stagegate_domain::{
    DomainError, ItemPair, Message, MissingStatePolicy, Participant, ParticipantId, Session,
    StageName, StageState, channel, discussion, quorum,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the chat stage use case
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatStageError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Message text is empty")]
    EmptyMessage,
}

/// Use case bound to one participant on one chat stage
pub struct ChatStageUseCase {
    store: Arc<SharedDocumentStore>,
    participant: ParticipantId,
    stage: StageName,
    policy: MissingStatePolicy,
    transcript: Arc<dyn TranscriptLogger>,
}

impl ChatStageUseCase {
    pub fn new(
        store: Arc<SharedDocumentStore>,
        identity: &dyn IdentityPort,
        config: &CoordinationConfig,
    ) -> Self {
        let (participant, stage) = identity.participant_and_stage();
        Self {
            store,
            participant,
            stage,
            policy: config.missing_state,
            transcript: Arc::new(NoTranscriptLogger),
        }
    }

    pub fn with_transcript(mut self, transcript: Arc<dyn TranscriptLogger>) -> Self {
        self.transcript = transcript;
        self
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub fn stage(&self) -> &StageName {
        &self.stage
    }

    // ==================== Mutations ====================

    /// Set this participant's readiness to end the stage
    pub fn toggle_readiness(&self, ready: bool) -> Result<Arc<Session>, ChatStageError> {
        let snapshot = self
            .store
            .mutate(&self.participant, &self.stage, |s| s.with_readiness(ready))?;

        info!(
            participant = %self.participant,
            stage = %self.stage,
            ready,
            version = snapshot.version(),
            "Readiness changed"
        );
        self.transcript.log(TranscriptEvent::new(
            "readiness_changed",
            json!({
                "session": snapshot.id(),
                "participant": self.participant,
                "stage": self.stage,
                "ready": ready,
                "version": snapshot.version(),
            }),
        ));
        Ok(snapshot)
    }

    /// Append a message from this participant; clears `is_silent` in the
    /// same commit.
    pub fn send_message(&self, text: &str) -> Result<Arc<Session>, ChatStageError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatStageError::EmptyMessage);
        }

        let message = Message::user(self.participant.clone(), text, now_millis());
        let snapshot = self
            .store
            .mutate(&self.participant, &self.stage, |s| channel::append(s, message))?;

        debug!(
            participant = %self.participant,
            stage = %self.stage,
            version = snapshot.version(),
            "Message sent"
        );
        self.transcript.log(TranscriptEvent::new(
            "message_sent",
            json!({
                "session": snapshot.id(),
                "participant": self.participant,
                "stage": self.stage,
                "text": text,
                "version": snapshot.version(),
            }),
        ));
        Ok(snapshot)
    }

    // ==================== Derived reads ====================

    pub fn messages(&self) -> Result<Vec<Message>, ChatStageError> {
        self.with_state(|s| Ok(s.messages().to_vec()))
    }

    /// Every participant except this one, in id order
    pub fn other_participants(&self) -> Result<Vec<Participant>, ChatStageError> {
        let snapshot = self.store.read()?;
        Ok(snapshot
            .other_participants(&self.participant)
            .cloned()
            .collect())
    }

    pub fn everyone_reached_stage(&self) -> Result<bool, ChatStageError> {
        Ok(self
            .store
            .read()?
            .everyone_reached_stage(&self.participant)?)
    }

    /// Whether the cohort is quorate right now, with the configured
    /// missing-state policy applied
    pub fn quorum_reached(&self) -> Result<bool, ChatStageError> {
        let snapshot = self.store.read()?;
        let result = quorum::quorum_reached(&snapshot, &self.stage, &self.participant);
        Ok(self.policy.apply(result)?)
    }

    pub fn discussion_queue(&self) -> Result<Vec<ItemPair>, ChatStageError> {
        self.with_state(|s| Ok(discussion::items(s).to_vec()))
    }

    /// The most recent discussion pair; `EmptyQueue` when none was seeded
    pub fn current_discussion_pair(&self) -> Result<ItemPair, ChatStageError> {
        self.with_state(|s| discussion::current(s).cloned())
    }

    /// All derived values from one snapshot
    pub fn view(&self) -> Result<ChatStageView, ChatStageError> {
        let snapshot = self.store.read()?;
        Ok(ChatStageView::derive(
            &snapshot,
            &self.participant,
            &self.stage,
        )?)
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&StageState) -> Result<T, DomainError>,
    ) -> Result<T, ChatStageError> {
        let snapshot = self.store.read()?;
        let state = snapshot.participant(&self.participant)?.stage_state(&self.stage)?;
        Ok(f(state)?)
    }
}
