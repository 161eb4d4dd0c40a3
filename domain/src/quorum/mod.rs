//! Readiness quorum domain
//!
//! # Core Concepts
//!
//! ## Cohort
//! The participants working on the same stage as the requester, requester
//! included exactly once. Participants on other stages are not members.
//!
//! ## Quorum
//! Every cohort member has `ready_to_end_stage = true` in the same snapshot.
//! It is a snapshot condition: one participant un-toggling before the
//! controller observes it invalidates quorum.
//!
//! ## Transition
//! Advancing the group past a stage. Keyed by (session, stage) and issued at
//! most once no matter how many snapshots report quorum.
//!
//! ```text
//! ┌──────────────┐  snapshot   ┌──────────────────┐  quorum?  ┌──────────────────┐
//! │ Session doc  │ ──────────> │ ReadinessTally   │ ────────> │ TransitionLedger │
//! │ (per commit) │             │ (pure, per stage)│           │ Pending -> Fired │
//! └──────────────┘             └──────────────────┘           └──────────────────┘
//! ```

pub mod policy;
pub mod readiness;
pub mod transition;

pub use policy::MissingStatePolicy;
pub use readiness::{ReadinessTally, cohort, quorum_reached};
pub use transition::{TransitionKey, TransitionLedger, TransitionState};
