//! Use cases
//!
//! Application-level operations that orchestrate domain logic over the
//! shared document store.

pub mod chat_stage;
pub mod mediator;
pub(crate) mod shared;
pub mod stage_transition;
pub mod views;
