//! Append-only message log for a stage

use super::message::Message;
use super::state::StageState;

/// Append a message to the stage's log.
///
/// A user message also clears `is_silent` in the same returned state, so the
/// store commits both changes as one cell mutation. Mediator messages leave
/// the flag alone.
pub fn append(mut state: StageState, message: Message) -> StageState {
    if message.is_from_user() {
        state.is_silent = false;
    }
    state.messages.push(message);
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ids::ParticipantId;

    #[test]
    fn test_user_message_clears_silence() {
        let state = StageState::silent();
        assert!(state.is_silent());

        let sent = Message::user(ParticipantId::new("alice"), "hello", 1_000);
        let state = append(state, sent.clone());

        assert!(!state.is_silent());
        assert_eq!(state.messages(), &[sent]);
    }

    #[test]
    fn test_mediator_message_keeps_silence() {
        let state = StageState::silent();
        let state = append(
            state,
            Message::mediator(ParticipantId::new("mediator"), "Please discuss", 5),
        );

        assert!(state.is_silent());
        assert_eq!(state.messages().len(), 1);
    }

    #[test]
    fn test_messages_keep_order() {
        let alice = ParticipantId::new("alice");
        let mut state = StageState::new();
        for (i, text) in ["one", "two", "three"].iter().enumerate() {
            state = append(state, Message::user(alice.clone(), *text, i as u64));
        }

        let texts: Vec<_> = state.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_append_does_not_touch_readiness() {
        let state = StageState::new().with_readiness(true);
        let state = append(state, Message::user(ParticipantId::new("a"), "hi", 0));
        assert!(state.ready_to_end_stage());
    }
}
