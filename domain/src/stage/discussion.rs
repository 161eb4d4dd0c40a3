//! Discussion queue accessors
//!
//! The queue only grows; the current pair is always the last one appended.
//! An empty queue is a normal state, so [`current`] returns an error rather
//! than a default pair.

use super::item::ItemPair;
use super::state::StageState;
use crate::core::error::DomainError;

/// All pairs in insertion order
pub fn items(state: &StageState) -> &[ItemPair] {
    state.discussion_queue()
}

/// The most recently appended pair
pub fn current(state: &StageState) -> Result<&ItemPair, DomainError> {
    state.discussion_queue().last().ok_or(DomainError::EmptyQueue)
}
