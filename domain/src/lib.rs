//! Domain layer for stagegate
//!
//! This crate contains the entities, value objects and pure derivations of
//! readiness-gated stage transitions. It has no dependencies on
//! infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Session
//!
//! One shared document per session holding every [`Participant`]. Each
//! participant owns a [`StageState`] per stage: its chat log, its
//! `ready_to_end_stage` toggle, its silence flag and the discussion queue.
//!
//! ## Readiness Quorum
//!
//! - **Cohort**: participants on the requester's current stage
//! - **Quorum**: every cohort member ready in one snapshot
//! - **Transition**: advancing the cohort, at most once per (session, stage)

pub mod config;
pub mod core;
pub mod participant;
pub mod quorum;
pub mod session;
pub mod stage;

// Re-export commonly used types
pub use config::{ConfigIssue, ConfigIssueCode, Severity};
pub use core::{
    error::DomainError,
    ids::{ParticipantId, SessionId, StageName},
};
pub use participant::{Participant, Profile};
pub use quorum::{
    MissingStatePolicy, ReadinessTally, TransitionKey, TransitionLedger, TransitionState,
};
pub use session::Session;
pub use stage::{Item, ItemPair, Message, MessageKind, StageState, channel, discussion};
