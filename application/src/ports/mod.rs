//! Port definitions (interfaces for external collaborators)
//!
//! Ports define the contracts that infrastructure adapters and the
//! surrounding UI must implement.

pub mod identity;
pub mod stage_progression;
pub mod store_observer;
pub mod transcript_logger;
