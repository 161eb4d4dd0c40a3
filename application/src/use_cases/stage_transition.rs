//! Stage transition controller
//!
//! Observes store commits, re-evaluates readiness for the touched stage and
//! issues the stage transition the first time the cohort is quorate.
//!
//! ```text
//!            quorum observed             (any later observation)
//! Pending ───────────────────> Fired ──────────────────────────> Fired
//!            next_step() once              next_step() never
//! ```
//!
//! The check and the Pending -> Fired write happen under one lock, so two
//! commits observing quorum at the same time cannot both fire. The
//! progression collaborator runs after that lock is released.
//!
//! Notifications can arrive out of version order. Under the lock the
//! controller evaluates the newest snapshot it can see (the attached
//! store's, when it is newer than the one handed in) and ignores any
//! snapshot older than one it already evaluated for the same key.

use crate::config::CoordinationConfig;
use crate::ports::stage_progression::{ProgressionError, StageProgression};
use crate::ports::store_observer::StoreObserver;
use crate::ports::transcript_logger::{NoTranscriptLogger, TranscriptEvent, TranscriptLogger};
use crate::store::{Commit, SharedDocumentStore, StoreError};
use serde_json::json;
use stagegate_domain::{
    DomainError, MissingStatePolicy, ParticipantId, ReadinessTally, Session, StageName,
    TransitionKey, TransitionLedger, TransitionState,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Errors from a single evaluation attempt.
///
/// None of these are fatal to the process; the controller keeps observing.
#[derive(Error, Debug)]
pub enum ControllerError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Stage progression failed: {0}")]
    Progression(#[from] ProgressionError),

    #[error("Transition ledger lock poisoned")]
    Poisoned,
}

/// Result of evaluating one snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// The requester is not working on this stage
    NotApplicable,
    /// A newer snapshot was already evaluated for this stage
    Superseded,
    /// Cohort not (yet) quorate
    NotQuorate,
    /// This evaluation issued the transition
    Fired,
    /// The transition had already been issued for this key
    AlreadyFired,
}

/// Ledger plus the newest snapshot version evaluated per key
#[derive(Default)]
struct ControllerState {
    transitions: TransitionLedger,
    evaluated: HashMap<TransitionKey, u64>,
}

impl ControllerState {
    /// Record `version` for `key`; false if a newer version was already seen.
    fn observe(&mut self, key: &TransitionKey, version: u64) -> bool {
        let seen = self.evaluated.entry(key.clone()).or_insert(version);
        if version < *seen {
            return false;
        }
        *seen = version;
        true
    }
}

/// Idempotency-guarded state machine over (session, stage) keys.
pub struct StageTransitionController {
    progression: Arc<dyn StageProgression>,
    transcript: Arc<dyn TranscriptLogger>,
    policy: MissingStatePolicy,
    store: Option<Weak<SharedDocumentStore>>,
    state: Mutex<ControllerState>,
}

impl StageTransitionController {
    pub fn new(progression: Arc<dyn StageProgression>, config: &CoordinationConfig) -> Self {
        Self {
            progression,
            transcript: Arc::new(NoTranscriptLogger),
            policy: config.missing_state,
            store: None,
            state: Mutex::new(ControllerState::default()),
        }
    }

    pub fn with_transcript(mut self, transcript: Arc<dyn TranscriptLogger>) -> Self {
        self.transcript = transcript;
        self
    }

    /// Re-read `store` before deciding, so a snapshot that was overtaken by a
    /// later commit never fires.
    pub fn with_store(mut self, store: &Arc<SharedDocumentStore>) -> Self {
        self.store = Some(Arc::downgrade(store));
        self
    }

    /// Current state for `key`
    pub fn state(&self, key: &TransitionKey) -> Result<TransitionState, ControllerError> {
        Ok(self.lock()?.transitions.state(key))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ControllerState>, ControllerError> {
        self.state.lock().map_err(|_| ControllerError::Poisoned)
    }

    /// Newest committed snapshot of the attached store, if any
    fn latest(&self) -> Result<Option<Arc<Session>>, ControllerError> {
        match self.store.as_ref().and_then(Weak::upgrade) {
            Some(store) => Ok(Some(store.read()?)),
            None => Ok(None),
        }
    }

    /// Evaluate quorum for `stage` on behalf of `requester` and fire the
    /// transition if this is the first quorate observation.
    ///
    /// `snapshot` is replaced by the attached store's latest snapshot when
    /// that one is newer.
    pub fn evaluate(
        &self,
        snapshot: &Session,
        stage: &StageName,
        requester: &ParticipantId,
    ) -> Result<Evaluation, ControllerError> {
        let key = TransitionKey::new(snapshot.id().clone(), stage.clone());

        let (tally, version) = {
            let mut state = self.lock()?;

            let latest = self.latest()?;
            let current: &Session = match latest.as_deref() {
                Some(latest) if latest.version() > snapshot.version() => latest,
                _ => snapshot,
            };
            let version = current.version();

            if !state.observe(&key, version) {
                debug!(key = %key, version, "Ignoring superseded snapshot");
                return Ok(Evaluation::Superseded);
            }

            if !current.participant(requester)?.is_on_stage(stage) {
                return Ok(Evaluation::NotApplicable);
            }

            if state.transitions.state(&key) == TransitionState::Fired {
                debug!(key = %key, version, "Transition already fired");
                return Ok(Evaluation::AlreadyFired);
            }

            let tally = match ReadinessTally::evaluate(current, stage, requester) {
                Ok(tally) => tally,
                Err(e) => {
                    self.policy.apply(Err(e))?;
                    debug!(key = %key, "Cohort member without stage state; not quorate");
                    return Ok(Evaluation::NotQuorate);
                }
            };

            if !tally.quorum_reached() {
                debug!(
                    key = %key,
                    version,
                    readiness = %tally.summary(),
                    "Waiting for readiness"
                );
                return Ok(Evaluation::NotQuorate);
            }

            debug_assert_eq!(
                state.transitions.state(&key),
                TransitionState::Pending,
                "{key} fired twice"
            );
            if let Err(e) = state.transitions.fire(key.clone()) {
                // Unreachable while the check above holds the same lock.
                error!(key = %key, error = %e, "Duplicate transition rejected");
                return Err(e.into());
            }
            (tally, version)
        };

        let cohort: Vec<ParticipantId> = tally.members.iter().map(|(id, _)| id.clone()).collect();
        info!(
            key = %key,
            version,
            cohort = cohort.len(),
            "Quorum reached; firing stage transition"
        );
        self.transcript.log(TranscriptEvent::new(
            "quorum_reached",
            json!({
                "session": key.session,
                "stage": key.stage,
                "version": version,
                "cohort": cohort,
            }),
        ));

        let result = self.progression.next_step(&key, &cohort);
        self.transcript.log(TranscriptEvent::new(
            "stage_transition",
            json!({
                "session": key.session,
                "stage": key.stage,
                "success": result.is_ok(),
                "error": result.as_ref().err().map(|e| e.to_string()),
            }),
        ));
        result?;
        Ok(Evaluation::Fired)
    }
}

impl StoreObserver for StageTransitionController {
    fn on_commit(&self, snapshot: &Session, commit: &Commit) {
        let Some(stage) = commit.change.affected_stage() else {
            return;
        };

        // A participant leaving `stage` shrinks its cohort; evaluate on
        // behalf of someone still there.
        let on_stage = |id: &ParticipantId| {
            snapshot
                .participant(id)
                .is_ok_and(|p| p.is_on_stage(stage))
        };
        let requester = if on_stage(&commit.participant) {
            &commit.participant
        } else {
            match snapshot.participants().find(|p| p.is_on_stage(stage)) {
                Some(member) => member.id(),
                None => return,
            }
        };

        match self.evaluate(snapshot, stage, requester) {
            Ok(_) => {}
            Err(ControllerError::Progression(e)) => {
                // The transition stays Fired; retrying would break at-most-once.
                warn!(stage = %stage, error = %e, "Stage progression failed after firing");
            }
            Err(e) => {
                warn!(
                    stage = %stage,
                    participant = %requester,
                    error = %e,
                    "Readiness evaluation failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagegate_domain::{Participant, Profile, SessionId, StageState};
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct RecordingProgression {
        calls: Mutex<Vec<(TransitionKey, Vec<ParticipantId>)>>,
    }

    impl RecordingProgression {
        fn count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl StageProgression for RecordingProgression {
        fn next_step(
            &self,
            key: &TransitionKey,
            cohort: &[ParticipantId],
        ) -> Result<(), ProgressionError> {
            self.calls
                .lock()
                .unwrap()
                .push((key.clone(), cohort.to_vec()));
            Ok(())
        }
    }

    struct FailingProgression;

    impl StageProgression for FailingProgression {
        fn next_step(
            &self,
            key: &TransitionKey,
            _cohort: &[ParticipantId],
        ) -> Result<(), ProgressionError> {
            Err(ProgressionError::NoNextStage(key.stage.clone()))
        }
    }

    fn chat() -> StageName {
        StageName::new("chat")
    }

    fn pid(id: &str) -> ParticipantId {
        ParticipantId::new(id)
    }

    fn store_with(ids: &[&str]) -> Arc<SharedDocumentStore> {
        let store = Arc::new(SharedDocumentStore::new(SessionId::new("s-1"), vec![chat()]));
        for id in ids {
            store
                .join(Participant::new(pid(id), Profile::named(*id), chat()))
                .unwrap();
            store.init_stage(&pid(id), &chat(), StageState::new()).unwrap();
        }
        store
    }

    fn setup(
        ids: &[&str],
        progression: Arc<dyn StageProgression>,
        config: CoordinationConfig,
    ) -> (Arc<SharedDocumentStore>, Arc<StageTransitionController>) {
        let store = store_with(ids);
        let controller =
            Arc::new(StageTransitionController::new(progression, &config).with_store(&store));
        store.subscribe(controller.clone()).unwrap();
        (store, controller)
    }

    fn key() -> TransitionKey {
        TransitionKey::new(SessionId::new("s-1"), chat())
    }

    fn set_ready(store: &SharedDocumentStore, id: &str, ready: bool) {
        store
            .mutate(&pid(id), &chat(), |s| s.with_readiness(ready))
            .unwrap();
    }

    #[test]
    fn test_three_participants_fire_exactly_once() {
        let progression = Arc::new(RecordingProgression::default());
        let (store, controller) = setup(
            &["alice", "bob", "carol"],
            progression.clone(),
            CoordinationConfig::default(),
        );

        set_ready(&store, "alice", true);
        assert_eq!(progression.count(), 0);
        assert_eq!(controller.state(&key()).unwrap(), TransitionState::Pending);

        set_ready(&store, "bob", true);
        set_ready(&store, "carol", true);
        assert_eq!(progression.count(), 1);
        assert_eq!(controller.state(&key()).unwrap(), TransitionState::Fired);

        // Five more evaluations of a quorate snapshot
        let snapshot = store.read().unwrap();
        for _ in 0..5 {
            let outcome = controller.evaluate(&snapshot, &chat(), &pid("alice")).unwrap();
            assert_eq!(outcome, Evaluation::AlreadyFired);
        }
        assert_eq!(progression.count(), 1);

        let calls = progression.calls.lock().unwrap();
        assert_eq!(calls[0].0, key());
        assert_eq!(calls[0].1, vec![pid("carol"), pid("alice"), pid("bob")]);
    }

    #[test]
    fn test_toggle_churn_after_fire_does_not_refire() {
        let progression = Arc::new(RecordingProgression::default());
        let (store, controller) =
            setup(&["alice", "bob"], progression.clone(), CoordinationConfig::default());

        set_ready(&store, "alice", true);
        set_ready(&store, "bob", true);
        assert_eq!(progression.count(), 1);

        set_ready(&store, "bob", false);
        set_ready(&store, "bob", true);
        set_ready(&store, "alice", false);
        set_ready(&store, "alice", true);

        assert_eq!(progression.count(), 1);
        assert_eq!(controller.state(&key()).unwrap(), TransitionState::Fired);
    }

    #[test]
    fn test_unready_before_quorum_invalidates() {
        let progression = Arc::new(RecordingProgression::default());
        let (store, _controller) =
            setup(&["alice", "bob"], progression.clone(), CoordinationConfig::default());

        set_ready(&store, "alice", true);
        set_ready(&store, "alice", false);
        set_ready(&store, "bob", true);
        assert_eq!(progression.count(), 0);

        set_ready(&store, "alice", true);
        assert_eq!(progression.count(), 1);
    }

    #[test]
    fn test_missing_state_is_not_quorate_by_default() {
        let progression = Arc::new(RecordingProgression::default());
        let (store, controller) =
            setup(&["alice"], progression.clone(), CoordinationConfig::default());
        store
            .join(Participant::new(pid("bob"), Profile::named("Bob"), chat()))
            .unwrap();

        set_ready(&store, "alice", true);
        assert_eq!(progression.count(), 0);

        let snapshot = store.read().unwrap();
        assert_eq!(
            controller.evaluate(&snapshot, &chat(), &pid("alice")).unwrap(),
            Evaluation::NotQuorate
        );
    }

    #[test]
    fn test_missing_state_propagates_when_configured() {
        let progression = Arc::new(RecordingProgression::default());
        let config = CoordinationConfig::default().with_missing_state(MissingStatePolicy::Propagate);
        let (store, controller) = setup(&["alice"], progression.clone(), config);
        store
            .join(Participant::new(pid("bob"), Profile::named("Bob"), chat()))
            .unwrap();
        set_ready(&store, "alice", true);

        let snapshot = store.read().unwrap();
        let err = controller
            .evaluate(&snapshot, &chat(), &pid("alice"))
            .unwrap_err();
        assert!(matches!(
            err,
            ControllerError::Domain(DomainError::MissingStageState { .. })
        ));
        assert_eq!(progression.count(), 0);
    }

    #[test]
    fn test_participant_on_other_stage_is_not_applicable() {
        let progression = Arc::new(RecordingProgression::default());
        let (store, controller) =
            setup(&["alice", "bob"], progression.clone(), CoordinationConfig::default());
        store
            .advance(&pid("bob"), &StageName::new("survey"), StageState::new())
            .unwrap();

        let snapshot = store.read().unwrap();
        assert_eq!(
            controller.evaluate(&snapshot, &chat(), &pid("bob")).unwrap(),
            Evaluation::NotApplicable
        );

        // Bob left the cohort, so alice alone is quorate
        set_ready(&store, "alice", true);
        assert_eq!(progression.count(), 1);
    }

    #[test]
    fn test_failed_progression_stays_fired() {
        let (store, controller) = setup(
            &["alice"],
            Arc::new(FailingProgression),
            CoordinationConfig::default(),
        );

        set_ready(&store, "alice", true);
        assert_eq!(controller.state(&key()).unwrap(), TransitionState::Fired);

        let snapshot = store.read().unwrap();
        assert_eq!(
            controller.evaluate(&snapshot, &chat(), &pid("alice")).unwrap(),
            Evaluation::AlreadyFired
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_toggles_fire_once() {
        let ids = ["p0", "p1", "p2", "p3", "p4", "p5"];
        let progression = Arc::new(RecordingProgression::default());
        let (store, controller) =
            setup(&ids, progression.clone(), CoordinationConfig::default());

        let mut tasks = tokio::task::JoinSet::new();
        for id in ids {
            let store = Arc::clone(&store);
            tasks.spawn_blocking(move || {
                for round in 0..20 {
                    let ready = round % 2 == 1;
                    store
                        .mutate(&ParticipantId::new(id), &StageName::new("chat"), |s| {
                            s.with_readiness(ready)
                        })
                        .unwrap();
                }
            });
        }
        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }

        // Everyone ends ready, so the last commit at the latest sees quorum.
        assert_eq!(progression.count(), 1);
        assert_eq!(controller.state(&key()).unwrap(), TransitionState::Fired);
    }

    /// Un-readies `target` from inside the notification of its ready commit,
    /// so observers registered later see the newer commit first.
    struct Unreadier {
        store: Weak<SharedDocumentStore>,
        target: ParticipantId,
        done: AtomicBool,
    }

    impl StoreObserver for Unreadier {
        fn on_commit(&self, snapshot: &Session, commit: &Commit) {
            if commit.participant != self.target {
                return;
            }
            let ready = snapshot
                .participant(&self.target)
                .and_then(|p| p.stage_state(&chat()))
                .is_ok_and(|s| s.ready_to_end_stage());
            if ready
                && !self.done.swap(true, Ordering::SeqCst)
                && let Some(store) = self.store.upgrade()
            {
                store
                    .mutate(&self.target, &chat(), |s| s.with_readiness(false))
                    .unwrap();
            }
        }
    }

    fn reentrant_unready(attach_store: bool) {
        let progression = Arc::new(RecordingProgression::default());
        let store = store_with(&["alice", "bob"]);
        store
            .subscribe(Arc::new(Unreadier {
                store: Arc::downgrade(&store),
                target: pid("bob"),
                done: AtomicBool::new(false),
            }))
            .unwrap();
        let mut controller =
            StageTransitionController::new(progression.clone(), &CoordinationConfig::default());
        if attach_store {
            controller = controller.with_store(&store);
        }
        let controller = Arc::new(controller);
        store.subscribe(controller.clone()).unwrap();

        set_ready(&store, "alice", true);
        set_ready(&store, "bob", true);

        let latest = store.read().unwrap();
        assert!(
            !latest
                .participant(&pid("bob"))
                .unwrap()
                .stage_state(&chat())
                .unwrap()
                .ready_to_end_stage()
        );
        assert_eq!(progression.count(), 0);
        assert_eq!(controller.state(&key()).unwrap(), TransitionState::Pending);
    }

    #[test]
    fn test_unready_delivered_first_blocks_older_quorate_snapshot() {
        reentrant_unready(true);
    }

    #[test]
    fn test_older_snapshot_is_superseded_without_store() {
        reentrant_unready(false);
    }

    #[test]
    fn test_stale_snapshot_replaced_by_latest() {
        let progression = Arc::new(RecordingProgression::default());
        let (store, controller) =
            setup(&["alice", "bob"], progression.clone(), CoordinationConfig::default());
        let detached = store_with(&["alice", "bob"]);

        set_ready(&detached, "alice", true);
        set_ready(&detached, "bob", true);
        set_ready(&store, "bob", true);
        set_ready(&store, "bob", false);
        set_ready(&store, "alice", true);
        set_ready(&store, "alice", false);
        set_ready(&store, "alice", true);
        assert_eq!(progression.count(), 0);

        // Quorate but older than what the store has committed since
        let quorate = detached.read().unwrap();
        assert!(quorate.version() < store.read().unwrap().version());
        assert_eq!(
            controller.evaluate(&quorate, &chat(), &pid("alice")).unwrap(),
            Evaluation::NotQuorate
        );
        assert_eq!(progression.count(), 0);
    }

    #[test]
    fn test_superseded_snapshot_ignored() {
        let progression = Arc::new(RecordingProgression::default());
        let controller =
            StageTransitionController::new(progression.clone(), &CoordinationConfig::default());
        let store = store_with(&["alice", "bob"]);

        set_ready(&store, "alice", true);
        set_ready(&store, "bob", true);
        let quorate = store.read().unwrap();
        set_ready(&store, "bob", false);
        let newer = store.read().unwrap();

        assert_eq!(
            controller.evaluate(&newer, &chat(), &pid("alice")).unwrap(),
            Evaluation::NotQuorate
        );
        assert_eq!(
            controller.evaluate(&quorate, &chat(), &pid("alice")).unwrap(),
            Evaluation::Superseded
        );
        assert_eq!(progression.count(), 0);
    }

    #[test]
    fn test_departure_of_unready_member_fires() {
        let progression = Arc::new(RecordingProgression::default());
        let (store, controller) =
            setup(&["alice", "bob"], progression.clone(), CoordinationConfig::default());

        set_ready(&store, "alice", true);
        assert_eq!(progression.count(), 0);

        store
            .advance(&pid("bob"), &StageName::new("survey"), StageState::new())
            .unwrap();

        assert_eq!(progression.count(), 1);
        assert_eq!(controller.state(&key()).unwrap(), TransitionState::Fired);
        let calls = progression.calls.lock().unwrap();
        assert_eq!(calls[0].1, vec![pid("alice")]);
    }

    #[test]
    fn test_last_member_leaving_does_not_fire() {
        let progression = Arc::new(RecordingProgression::default());
        let (store, controller) =
            setup(&["alice"], progression.clone(), CoordinationConfig::default());

        store
            .advance(&pid("alice"), &StageName::new("survey"), StageState::new())
            .unwrap();

        assert_eq!(progression.count(), 0);
        assert_eq!(controller.state(&key()).unwrap(), TransitionState::Pending);
    }

    #[test]
    fn test_poisoned_ledger_is_reported() {
        let (store, controller) = setup(
            &["alice"],
            Arc::new(RecordingProgression::default()),
            CoordinationConfig::default(),
        );
        let holder = Arc::clone(&controller);
        let _ = std::thread::spawn(move || {
            let _guard = holder.state.lock().unwrap();
            panic!("writer panicked while holding the ledger");
        })
        .join();

        assert!(matches!(
            controller.state(&key()),
            Err(ControllerError::Poisoned)
        ));
        let snapshot = store.read().unwrap();
        assert!(matches!(
            controller.evaluate(&snapshot, &chat(), &pid("alice")),
            Err(ControllerError::Poisoned)
        ));
    }
}
