//! Chat messages

use crate::core::ids::ParticipantId;
use serde::{Deserialize, Serialize};

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Typed by the participant
    User,
    /// Injected by the mediator process into a participant's log
    Mediator,
}

/// A message in a stage's chat log (Entity)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender_id: ParticipantId,
    pub text: String,
    /// Milliseconds since epoch
    pub timestamp: u64,
    pub kind: MessageKind,
}

impl Message {
    pub fn user(sender_id: ParticipantId, text: impl Into<String>, timestamp: u64) -> Self {
        Self {
            sender_id,
            text: text.into(),
            timestamp,
            kind: MessageKind::User,
        }
    }

    pub fn mediator(sender_id: ParticipantId, text: impl Into<String>, timestamp: u64) -> Self {
        Self {
            sender_id,
            text: text.into(),
            timestamp,
            kind: MessageKind::Mediator,
        }
    }

    pub fn is_from_user(&self) -> bool {
        self.kind == MessageKind::User
    }
}
