//! Chat-stage state owned by a single participant

use super::item::ItemPair;
use super::message::Message;
use serde::{Deserialize, Serialize};

/// One participant's state for one chat stage.
///
/// Fields are private so the only ways to change them are the
/// copy-on-write methods below and [`super::channel::append`]. That keeps
/// the message log and the discussion queue append-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageState {
    pub(super) messages: Vec<Message>,
    pub(super) ready_to_end_stage: bool,
    pub(super) is_silent: bool,
    pub(super) discussion_queue: Vec<ItemPair>,
}

impl StageState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A state that starts silent; the participant's first message clears it.
    pub fn silent() -> Self {
        Self {
            is_silent: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn ready_to_end_stage(&self) -> bool {
        self.ready_to_end_stage
    }

    pub fn is_silent(&self) -> bool {
        self.is_silent
    }

    pub fn discussion_queue(&self) -> &[ItemPair] {
        &self.discussion_queue
    }

    /// Set the readiness toggle. Only the owning participant's mutations
    /// should reach this.
    pub fn with_readiness(mut self, ready: bool) -> Self {
        self.ready_to_end_stage = ready;
        self
    }

    /// Append a pair to the discussion queue; it becomes the current pair.
    pub fn with_discussion_pair(mut self, pair: ItemPair) -> Self {
        self.discussion_queue.push(pair);
        self
    }
}
