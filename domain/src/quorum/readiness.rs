//! Readiness aggregation over a session snapshot

use crate::core::error::DomainError;
use crate::core::ids::{ParticipantId, StageName};
use crate::participant::Participant;
use crate::session::Session;
use serde::{Deserialize, Serialize};

/// The requester followed by every other participant on the requester's
/// current stage, in id order.
pub fn cohort<'a>(
    session: &'a Session,
    requester: &ParticipantId,
) -> Result<Vec<&'a Participant>, DomainError> {
    let me = session.participant(requester)?;
    let stage = me.current_stage_name();

    let mut members = vec![me];
    members.extend(
        session
            .other_participants(me.id())
            .filter(|p| p.is_on_stage(stage)),
    );
    Ok(members)
}

/// Whether every cohort member is ready to end `stage`
///
/// Fails with [`DomainError::MissingStageState`] if any member has no state
/// for `stage`; the caller decides how to treat that (see
/// [`super::MissingStatePolicy`]).
pub fn quorum_reached(
    session: &Session,
    stage: &StageName,
    requester: &ParticipantId,
) -> Result<bool, DomainError> {
    Ok(ReadinessTally::evaluate(session, stage, requester)?.quorum_reached())
}

/// Per-member readiness for one stage, computed from one snapshot
///
/// # Example
///
/// ```
/// use stagegate_domain::{Participant, ParticipantId, Profile, ReadinessTally, Session, SessionId, StageName, StageState};
///
/// let chat = StageName::new("chat");
/// let mut session = Session::new(SessionId::new("s"), vec![chat.clone()]);
/// for (id, ready) in [("alice", true), ("bob", false)] {
///     let p = Participant::new(ParticipantId::new(id), Profile::named(id), chat.clone())
///         .with_stage_state(chat.clone(), StageState::new().with_readiness(ready));
///     session.insert_participant(p).unwrap();
/// }
///
/// let tally = ReadinessTally::evaluate(&session, &chat, &ParticipantId::new("alice")).unwrap();
/// assert!(!tally.quorum_reached());
/// assert_eq!(tally.summary(), "[●○]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessTally {
    pub stage: StageName,
    /// Cohort members in cohort order, with their readiness
    pub members: Vec<(ParticipantId, bool)>,
}

impl ReadinessTally {
    pub fn evaluate(
        session: &Session,
        stage: &StageName,
        requester: &ParticipantId,
    ) -> Result<Self, DomainError> {
        let members = cohort(session, requester)?
            .into_iter()
            .map(|p| {
                let ready = p.stage_state(stage)?.ready_to_end_stage();
                Ok((p.id().clone(), ready))
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        Ok(Self {
            stage: stage.clone(),
            members,
        })
    }

    /// Cohort size, the quorum denominator
    pub fn cohort_size(&self) -> usize {
        self.members.len()
    }

    pub fn ready_count(&self) -> usize {
        self.members.iter().filter(|(_, ready)| *ready).count()
    }

    /// True iff every member is ready. The cohort always contains the
    /// requester, so it is never empty.
    pub fn quorum_reached(&self) -> bool {
        !self.members.is_empty() && self.ready_count() == self.cohort_size()
    }

    /// Members not yet ready
    pub fn pending(&self) -> impl Iterator<Item = &ParticipantId> {
        self.members
            .iter()
            .filter(|(_, ready)| !*ready)
            .map(|(id, _)| id)
    }

    /// Visual summary (e.g., "[●●○]")
    pub fn summary(&self) -> String {
        let mut summary = String::from("[");
        for (_, ready) in &self.members {
            summary.push(if *ready { '●' } else { '○' });
        }
        summary.push(']');
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::SessionId;
    use crate::participant::Profile;
    use crate::stage::StageState;

    fn chat() -> StageName {
        StageName::new("chat")
    }

    fn member(id: &str, stage: &str, ready: Option<bool>) -> Participant {
        let p = Participant::new(ParticipantId::new(id), Profile::named(id), StageName::new(stage));
        match ready {
            Some(r) => p.with_stage_state(chat(), StageState::new().with_readiness(r)),
            None => p,
        }
    }

    fn session(members: Vec<Participant>) -> Session {
        let mut session = Session::new(SessionId::new("s"), vec![chat(), StageName::new("survey")]);
        for m in members {
            session.insert_participant(m).unwrap();
        }
        session
    }

    #[test]
    fn test_cohort_includes_self_once() {
        let s = session(vec![
            member("alice", "chat", Some(false)),
            member("bob", "chat", Some(false)),
        ]);
        let ids: Vec<_> = cohort(&s, &ParticipantId::new("bob"))
            .unwrap()
            .iter()
            .map(|p| p.id().as_str())
            .collect();
        assert_eq!(ids, vec!["bob", "alice"]);
    }

    #[test]
    fn test_cohort_excludes_other_stages() {
        let s = session(vec![
            member("alice", "chat", Some(true)),
            member("bob", "survey", Some(false)),
            member("carol", "chat", Some(true)),
        ]);
        let tally = ReadinessTally::evaluate(&s, &chat(), &ParticipantId::new("alice")).unwrap();
        assert_eq!(tally.cohort_size(), 2);
        assert!(tally.quorum_reached());
    }

    #[test]
    fn test_three_participants_scenario() {
        let alice = ParticipantId::new("alice");
        let s = session(vec![
            member("alice", "chat", Some(false)),
            member("bob", "chat", Some(false)),
            member("carol", "chat", Some(false)),
        ]);
        assert!(!quorum_reached(&s, &chat(), &alice).unwrap());

        let s = session(vec![
            member("alice", "chat", Some(true)),
            member("bob", "chat", Some(false)),
            member("carol", "chat", Some(false)),
        ]);
        assert!(!quorum_reached(&s, &chat(), &alice).unwrap());

        let s = session(vec![
            member("alice", "chat", Some(true)),
            member("bob", "chat", Some(true)),
            member("carol", "chat", Some(true)),
        ]);
        assert!(quorum_reached(&s, &chat(), &alice).unwrap());
    }

    #[test]
    fn test_requester_not_ready_blocks_quorum() {
        let s = session(vec![
            member("alice", "chat", Some(false)),
            member("bob", "chat", Some(true)),
        ]);
        let tally = ReadinessTally::evaluate(&s, &chat(), &ParticipantId::new("alice")).unwrap();
        assert!(!tally.quorum_reached());
        let pending: Vec<_> = tally.pending().map(|p| p.as_str()).collect();
        assert_eq!(pending, vec!["alice"]);
    }

    #[test]
    fn test_single_participant_cohort() {
        let s = session(vec![member("alice", "chat", Some(true))]);
        assert!(quorum_reached(&s, &chat(), &ParticipantId::new("alice")).unwrap());
    }

    #[test]
    fn test_missing_stage_state_fails() {
        let s = session(vec![
            member("alice", "chat", Some(true)),
            member("bob", "chat", None),
        ]);
        let err = quorum_reached(&s, &chat(), &ParticipantId::new("alice")).unwrap_err();
        assert_eq!(
            err,
            DomainError::MissingStageState {
                participant: ParticipantId::new("bob"),
                stage: chat(),
            }
        );
    }

    #[test]
    fn test_unknown_requester() {
        let s = session(vec![member("alice", "chat", Some(true))]);
        let err = quorum_reached(&s, &chat(), &ParticipantId::new("zed")).unwrap_err();
        assert!(matches!(err, DomainError::UnknownParticipant(_)));
    }

    #[test]
    fn test_summary() {
        let s = session(vec![
            member("alice", "chat", Some(true)),
            member("bob", "chat", Some(true)),
            member("carol", "chat", Some(false)),
        ]);
        let tally = ReadinessTally::evaluate(&s, &chat(), &ParticipantId::new("alice")).unwrap();
        assert_eq!(tally.summary(), "[●●○]");
        assert_eq!(tally.ready_count(), 2);
    }
}
