//! Mediator use case
//!
//! Entry points for the external processes that seed discussion pairs and
//! inject mediator messages into participants' chat logs.

use super::shared::now_millis;
use crate::ports::transcript_logger::{NoTranscriptLogger, TranscriptEvent, TranscriptLogger};
use crate::store::{SharedDocumentStore, StoreError};
use serde_json::json;
use stagegate_domain::{ItemPair, Message, ParticipantId, Session, StageName, channel};
use std::sync::Arc;
use tracing::{debug, info};

/// Use case for the mediator/seeding process
pub struct MediatorUseCase {
    store: Arc<SharedDocumentStore>,
    mediator_id: ParticipantId,
    transcript: Arc<dyn TranscriptLogger>,
}

impl MediatorUseCase {
    pub fn new(store: Arc<SharedDocumentStore>, mediator_id: impl Into<ParticipantId>) -> Self {
        Self {
            store,
            mediator_id: mediator_id.into(),
            transcript: Arc::new(NoTranscriptLogger),
        }
    }

    pub fn with_transcript(mut self, transcript: Arc<dyn TranscriptLogger>) -> Self {
        self.transcript = transcript;
        self
    }

    /// Append a pair to one participant's discussion queue
    pub fn seed_pair(
        &self,
        participant: &ParticipantId,
        stage: &StageName,
        pair: ItemPair,
    ) -> Result<Arc<Session>, StoreError> {
        let label = pair.to_string();
        let snapshot = self
            .store
            .mutate(participant, stage, |s| s.with_discussion_pair(pair))?;

        debug!(participant = %participant, stage = %stage, pair = %label, "Discussion pair seeded");
        self.transcript.log(TranscriptEvent::new(
            "discussion_seeded",
            json!({
                "session": snapshot.id(),
                "participant": participant,
                "stage": stage,
                "pair": label,
                "version": snapshot.version(),
            }),
        ));
        Ok(snapshot)
    }

    /// Append a pair to every participant that has state for `stage`.
    /// Returns how many queues were extended.
    pub fn seed_pair_for_stage(
        &self,
        stage: &StageName,
        pair: &ItemPair,
    ) -> Result<usize, StoreError> {
        let targets: Vec<ParticipantId> = self
            .store
            .read()?
            .participants()
            .filter(|p| p.has_stage_state(stage))
            .map(|p| p.id().clone())
            .collect();

        for participant in &targets {
            self.seed_pair(participant, stage, pair.clone())?;
        }
        info!(stage = %stage, count = targets.len(), pair = %pair, "Seeded discussion pair");
        Ok(targets.len())
    }

    /// Append a mediator message to a participant's log. Does not clear the
    /// participant's silence flag.
    pub fn post_message(
        &self,
        participant: &ParticipantId,
        stage: &StageName,
        text: &str,
    ) -> Result<Arc<Session>, StoreError> {
        let message = Message::mediator(self.mediator_id.clone(), text, now_millis());
        let snapshot = self
            .store
            .mutate(participant, stage, |s| channel::append(s, message))?;

        self.transcript.log(TranscriptEvent::new(
            "mediator_message",
            json!({
                "session": snapshot.id(),
                "participant": participant,
                "stage": stage,
                "text": text,
                "version": snapshot.version(),
            }),
        ));
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagegate_domain::{
        DomainError, Item, MessageKind, Participant, Profile, SessionId, StageState, discussion,
    };

    fn chat() -> StageName {
        StageName::new("chat")
    }

    fn setup() -> Arc<SharedDocumentStore> {
        let store = Arc::new(SharedDocumentStore::new(SessionId::new("s"), vec![chat()]));
        for id in ["alice", "bob"] {
            let pid = ParticipantId::new(id);
            store
                .join(Participant::new(pid.clone(), Profile::named(id), chat()))
                .unwrap();
            store.init_stage(&pid, &chat(), StageState::silent()).unwrap();
        }
        store
            .join(Participant::new(
                ParticipantId::new("late"),
                Profile::named("late"),
                chat(),
            ))
            .unwrap();
        store
    }

    #[test]
    fn test_seed_pair_for_stage_skips_uninitialised() {
        let store = setup();
        let mediator = MediatorUseCase::new(Arc::clone(&store), "mediator");
        let pair = ItemPair::new(Item::new("1", "rope"), Item::new("2", "torch"));

        let count = mediator.seed_pair_for_stage(&chat(), &pair).unwrap();
        assert_eq!(count, 2);

        let snapshot = store.read().unwrap();
        for id in ["alice", "bob"] {
            let state = snapshot
                .participant(&ParticipantId::new(id))
                .unwrap()
                .stage_state(&chat())
                .unwrap();
            assert_eq!(discussion::current(state), Ok(&pair));
        }
    }

    #[test]
    fn test_seed_pair_missing_state() {
        let store = setup();
        let mediator = MediatorUseCase::new(Arc::clone(&store), "mediator");
        let pair = ItemPair::new(Item::new("1", "rope"), Item::new("2", "torch"));

        let err = mediator
            .seed_pair(&ParticipantId::new("late"), &chat(), pair)
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(DomainError::MissingStageState { .. })
        ));
    }

    #[test]
    fn test_mediator_message_keeps_silence() {
        let store = setup();
        let mediator = MediatorUseCase::new(Arc::clone(&store), "mediator");
        let alice = ParticipantId::new("alice");

        let snapshot = mediator
            .post_message(&alice, &chat(), "Please compare the two items")
            .unwrap();

        let state = snapshot.participant(&alice).unwrap().stage_state(&chat()).unwrap();
        assert!(state.is_silent());
        assert_eq!(state.messages()[0].kind, MessageKind::Mediator);
        assert_eq!(state.messages()[0].sender_id, ParticipantId::new("mediator"));
    }
}
