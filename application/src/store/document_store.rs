//! Copy-on-write document store with per-participant cells

use super::commit::{Change, Commit};
use crate::ports::store_observer::StoreObserver;
use stagegate_domain::{
    DomainError, Participant, ParticipantId, Session, SessionId, StageName, StageState,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, trace};

/// Errors from store operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Store lock poisoned by a panicking writer")]
    Poisoned,
}

impl<T> From<PoisonError<T>> for StoreError {
    fn from(_: PoisonError<T>) -> Self {
        StoreError::Poisoned
    }
}

/// Holds one session document and publishes a new snapshot per commit.
///
/// - `read` returns the latest committed snapshot; it never observes a
///   half-applied mutation.
/// - `mutate` applies a pure function to exactly one participant's stage
///   state. Calls for the same participant are serialized on that
///   participant's cell lock and take effect in submission order.
/// - Observers run after the commit is published and after the cell lock is
///   released, so an observer may call back into the store.
pub struct SharedDocumentStore {
    snapshot: RwLock<Arc<Session>>,
    cells: RwLock<HashMap<ParticipantId, Arc<Mutex<()>>>>,
    observers: RwLock<Vec<Arc<dyn StoreObserver>>>,
}

impl SharedDocumentStore {
    /// Create a store holding an empty session
    pub fn new(id: SessionId, stages: Vec<StageName>) -> Self {
        Self::from_session(Session::new(id, stages))
    }

    /// Create a store from an existing document
    pub fn from_session(session: Session) -> Self {
        let cells = session
            .participants()
            .map(|p| (p.id().clone(), Arc::new(Mutex::new(()))))
            .collect();
        Self {
            snapshot: RwLock::new(Arc::new(session)),
            cells: RwLock::new(cells),
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Latest committed snapshot
    pub fn read(&self) -> Result<Arc<Session>, StoreError> {
        Ok(Arc::clone(&*self.snapshot.read()?))
    }

    /// Register an observer for subsequent commits
    pub fn subscribe(&self, observer: Arc<dyn StoreObserver>) -> Result<(), StoreError> {
        self.observers.write()?.push(observer);
        Ok(())
    }

    /// Add a participant to the session and create its cell
    pub fn join(&self, participant: Participant) -> Result<Arc<Session>, StoreError> {
        let id = participant.id().clone();
        let stage = participant.current_stage_name().clone();

        let snapshot = {
            let mut cells = self.cells.write()?;
            if cells.contains_key(&id) {
                return Err(DomainError::DuplicateParticipant(id).into());
            }

            let mut current = self.snapshot.write()?;
            let mut next = (**current).clone();
            next.insert_participant(participant)?;
            next.bump_version();

            let next = Arc::new(next);
            *current = Arc::clone(&next);
            cells.insert(id.clone(), Arc::new(Mutex::new(())));
            next
        };

        debug!(
            session = %snapshot.id(),
            participant = %id,
            version = snapshot.version(),
            "Participant joined"
        );

        let commit = Commit {
            version: snapshot.version(),
            participant: id,
            change: Change::Joined { stage },
        };
        self.notify(&snapshot, &commit)?;
        Ok(snapshot)
    }

    /// Create a participant's state for `stage`.
    ///
    /// Fails with [`DomainError::StageAlreadyInitialized`] if the state
    /// exists; readiness and logs are never reset from outside.
    pub fn init_stage(
        &self,
        participant: &ParticipantId,
        stage: &StageName,
        state: StageState,
    ) -> Result<Arc<Session>, StoreError> {
        self.commit_cell(participant, |current| {
            if current.has_stage_state(stage) {
                return Err(DomainError::StageAlreadyInitialized {
                    participant: participant.clone(),
                    stage: stage.clone(),
                });
            }
            let updated = current.clone().with_stage_state(stage.clone(), state);
            Ok((
                updated,
                Change::StageInitialized {
                    stage: stage.clone(),
                },
            ))
        })
    }

    /// Apply `f` to one participant's state for `stage` and commit the result.
    ///
    /// Fails with [`DomainError::MissingStageState`] if the participant has
    /// no state for `stage`; `f` is not called in that case.
    pub fn mutate<F>(
        &self,
        participant: &ParticipantId,
        stage: &StageName,
        f: F,
    ) -> Result<Arc<Session>, StoreError>
    where
        F: FnOnce(StageState) -> StageState,
    {
        self.commit_cell(participant, |current| {
            let state = current.stage_state(stage)?.clone();
            let updated = current.clone().with_stage_state(stage.clone(), f(state));
            Ok((
                updated,
                Change::StageStateMutated {
                    stage: stage.clone(),
                },
            ))
        })
    }

    /// Move a participant to stage `to`, creating `initial` there if the
    /// participant has no state for it yet.
    pub fn advance(
        &self,
        participant: &ParticipantId,
        to: &StageName,
        initial: StageState,
    ) -> Result<Arc<Session>, StoreError> {
        self.commit_cell(participant, |current| {
            let from = current.current_stage_name().clone();
            let mut updated = current.clone().with_current_stage(to.clone());
            if !updated.has_stage_state(to) {
                updated = updated.with_stage_state(to.clone(), initial);
            }
            Ok((updated, Change::Advanced { from, to: to.clone() }))
        })
    }

    /// Serialize on the participant's cell, compute the new record, publish
    /// it, then notify observers with the cell released.
    fn commit_cell<F>(&self, participant: &ParticipantId, f: F) -> Result<Arc<Session>, StoreError>
    where
        F: FnOnce(&Participant) -> Result<(Participant, Change), DomainError>,
    {
        let cell = self
            .cells
            .read()?
            .get(participant)
            .cloned()
            .ok_or_else(|| DomainError::UnknownParticipant(participant.clone()))?;

        let (snapshot, change) = {
            let _guard = cell.lock()?;

            // Only this cell's holder writes this participant's record, so the
            // record read here is still current when the swap below happens.
            let current = self.read()?.participant(participant)?.clone();
            let (updated, change) = f(&current)?;

            let mut published = self.snapshot.write()?;
            let mut next = (**published).clone();
            next.replace_participant(updated)?;
            next.bump_version();

            let next = Arc::new(next);
            *published = Arc::clone(&next);
            (next, change)
        };

        trace!(
            session = %snapshot.id(),
            participant = %participant,
            version = snapshot.version(),
            change = ?change,
            "Committed cell mutation"
        );

        let commit = Commit {
            version: snapshot.version(),
            participant: participant.clone(),
            change,
        };
        self.notify(&snapshot, &commit)?;
        Ok(snapshot)
    }

    fn notify(&self, snapshot: &Session, commit: &Commit) -> Result<(), StoreError> {
        // Clone the list so observers can subscribe or mutate re-entrantly.
        let observers = self.observers.read()?.clone();
        for observer in observers {
            observer.on_commit(snapshot, commit);
        }
        Ok(())
    }
}
