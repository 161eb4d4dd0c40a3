//! Session participants

pub mod entities;

pub use entities::{Participant, Profile};
