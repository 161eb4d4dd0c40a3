//! Derived chat-stage views
//!
//! [`ChatStageView`] is a pure projection of one snapshot for one
//! participant. [`ChatStageViews`] recomputes it after every commit and
//! publishes it on a `tokio::sync::watch` channel, so UI collaborators read
//! the latest view without polling.

use crate::ports::store_observer::StoreObserver;
use crate::store::{Commit, SharedDocumentStore, StoreError};
use serde::Serialize;
use stagegate_domain::{
    DomainError, ItemPair, Message, ParticipantId, Profile, ReadinessTally, Session, StageName,
    discussion,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

/// Another participant as shown in the chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantSummary {
    pub id: ParticipantId,
    pub profile: Profile,
    pub current_stage_name: StageName,
}

/// Readiness of the cohort at one snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuorumStatus {
    /// Every cohort member is ready
    Reached,
    /// Members not ready yet
    Waiting { pending: Vec<ParticipantId> },
    /// A member has no state for the stage
    Incomplete { missing: ParticipantId },
}

/// Everything the chat UI reads for one participant and stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatStageView {
    /// Session version the view was derived from
    pub version: u64,
    pub participant: ParticipantId,
    pub stage: StageName,
    pub messages: Vec<Message>,
    pub other_participants: Vec<ParticipantSummary>,
    pub everyone_reached_stage: bool,
    pub quorum: QuorumStatus,
    pub ready_to_end_stage: bool,
    pub is_silent: bool,
    pub discussion_queue: Vec<ItemPair>,
    pub current_discussion_pair: Option<ItemPair>,
}

impl ChatStageView {
    pub fn derive(
        snapshot: &Session,
        participant: &ParticipantId,
        stage: &StageName,
    ) -> Result<Self, DomainError> {
        let me = snapshot.participant(participant)?;
        let state = me.stage_state(stage)?;

        let quorum = match ReadinessTally::evaluate(snapshot, stage, participant) {
            Ok(tally) if tally.quorum_reached() => QuorumStatus::Reached,
            Ok(tally) => QuorumStatus::Waiting {
                pending: tally.pending().cloned().collect(),
            },
            Err(DomainError::MissingStageState { participant, .. }) => QuorumStatus::Incomplete {
                missing: participant,
            },
            Err(e) => return Err(e),
        };

        Ok(Self {
            version: snapshot.version(),
            participant: participant.clone(),
            stage: stage.clone(),
            messages: state.messages().to_vec(),
            other_participants: snapshot
                .other_participants(me.id())
                .map(|p| ParticipantSummary {
                    id: p.id().clone(),
                    profile: p.profile().clone(),
                    current_stage_name: p.current_stage_name().clone(),
                })
                .collect(),
            everyone_reached_stage: snapshot.everyone_reached_stage(participant)?,
            quorum,
            ready_to_end_stage: state.ready_to_end_stage(),
            is_silent: state.is_silent(),
            discussion_queue: discussion::items(state).to_vec(),
            current_discussion_pair: discussion::current(state).ok().cloned(),
        })
    }

    pub fn quorum_reached(&self) -> bool {
        self.quorum == QuorumStatus::Reached
    }
}

/// Store observer publishing a fresh [`ChatStageView`] per commit
pub struct ChatStageViews {
    participant: ParticipantId,
    stage: StageName,
    sender: watch::Sender<ChatStageView>,
}

impl ChatStageViews {
    /// Derive the initial view, register on `store` and return the publisher.
    pub fn attach(
        store: &SharedDocumentStore,
        participant: ParticipantId,
        stage: StageName,
    ) -> Result<Arc<Self>, StoreError> {
        let snapshot = store.read()?;
        let initial = ChatStageView::derive(&snapshot, &participant, &stage)?;
        let (sender, _) = watch::channel(initial);
        let views = Arc::new(Self {
            participant,
            stage,
            sender,
        });
        store.subscribe(views.clone())?;

        // Catch commits that landed between the first read and subscribe.
        let latest = store.read()?;
        views.publish(&latest);
        Ok(views)
    }

    pub fn subscribe(&self) -> watch::Receiver<ChatStageView> {
        self.sender.subscribe()
    }

    /// Latest published view
    pub fn current(&self) -> ChatStageView {
        self.sender.borrow().clone()
    }

    fn publish(&self, snapshot: &Session) {
        match ChatStageView::derive(snapshot, &self.participant, &self.stage) {
            Ok(view) => {
                // Notifications from different participants may arrive out of
                // version order; keep the newest.
                self.sender.send_if_modified(|current| {
                    if view.version > current.version {
                        *current = view;
                        true
                    } else {
                        false
                    }
                });
            }
            Err(e) => warn!(
                participant = %self.participant,
                stage = %self.stage,
                error = %e,
                "Could not derive chat view"
            ),
        }
    }
}

impl StoreObserver for ChatStageViews {
    fn on_commit(&self, snapshot: &Session, _commit: &Commit) {
        self.publish(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagegate_domain::{Item, Participant, SessionId, StageState, channel};

    fn chat() -> StageName {
        StageName::new("chat")
    }

    fn pid(id: &str) -> ParticipantId {
        ParticipantId::new(id)
    }

    fn store_with(ids: &[&str]) -> SharedDocumentStore {
        let store = SharedDocumentStore::new(SessionId::new("s"), vec![chat()]);
        for id in ids {
            store
                .join(Participant::new(pid(id), Profile::named(*id), chat()))
                .unwrap();
            store.init_stage(&pid(id), &chat(), StageState::silent()).unwrap();
        }
        store
    }

    #[test]
    fn test_derive_view() {
        let store = store_with(&["alice", "bob"]);
        let pair = ItemPair::new(Item::new("1", "rope"), Item::new("2", "torch"));
        store
            .mutate(&pid("alice"), &chat(), |s| {
                channel::append(s, Message::user(pid("alice"), "hello", 7))
                    .with_discussion_pair(pair.clone())
                    .with_readiness(true)
            })
            .unwrap();

        let view = ChatStageView::derive(&store.read().unwrap(), &pid("alice"), &chat()).unwrap();
        assert_eq!(view.messages.len(), 1);
        assert!(!view.is_silent);
        assert!(view.ready_to_end_stage);
        assert!(view.everyone_reached_stage);
        assert_eq!(view.other_participants.len(), 1);
        assert_eq!(view.other_participants[0].id, pid("bob"));
        assert_eq!(view.current_discussion_pair, Some(pair));
        assert_eq!(
            view.quorum,
            QuorumStatus::Waiting {
                pending: vec![pid("bob")]
            }
        );
        assert!(!view.quorum_reached());
    }

    #[test]
    fn test_derive_view_with_incomplete_cohort() {
        let store = store_with(&["alice"]);
        store
            .join(Participant::new(pid("bob"), Profile::named("bob"), chat()))
            .unwrap();

        let view = ChatStageView::derive(&store.read().unwrap(), &pid("alice"), &chat()).unwrap();
        assert_eq!(view.quorum, QuorumStatus::Incomplete { missing: pid("bob") });
        assert_eq!(view.current_discussion_pair, None);
    }

    #[test]
    fn test_views_follow_commits() {
        let store = store_with(&["alice", "bob"]);
        let views = ChatStageViews::attach(&store, pid("alice"), chat()).unwrap();
        let mut rx = views.subscribe();
        assert!(!rx.borrow().quorum_reached());

        store
            .mutate(&pid("alice"), &chat(), |s| s.with_readiness(true))
            .unwrap();
        store
            .mutate(&pid("bob"), &chat(), |s| s.with_readiness(true))
            .unwrap();

        assert!(rx.has_changed().unwrap());
        let latest = rx.borrow_and_update().clone();
        assert!(latest.quorum_reached());
        assert_eq!(latest.version, store.read().unwrap().version());
        assert_eq!(views.current(), latest);
    }

    #[test]
    fn test_stale_snapshot_is_not_published() {
        let store = store_with(&["alice"]);
        let views = ChatStageViews::attach(&store, pid("alice"), chat()).unwrap();
        let stale = store.read().unwrap();

        store
            .mutate(&pid("alice"), &chat(), |s| s.with_readiness(true))
            .unwrap();
        let newest = views.current().version;

        views.publish(&stale);
        assert_eq!(views.current().version, newest);
        assert!(views.current().ready_to_end_stage);
    }
}
