//! Application layer for stagegate
//!
//! This crate contains the shared document store, the use cases, port
//! definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod store;
pub mod use_cases;

// Re-export commonly used types
pub use config::CoordinationConfig;
pub use ports::{
    identity::{FixedIdentity, IdentityPort},
    stage_progression::{NoProgression, ProgressionError, StageProgression},
    store_observer::StoreObserver,
    transcript_logger::{NoTranscriptLogger, TranscriptEvent, TranscriptLogger},
};
pub use store::{Change, Commit, SharedDocumentStore, StoreError, TranscriptObserver};
pub use use_cases::chat_stage::{ChatStageError, ChatStageUseCase};
pub use use_cases::mediator::MediatorUseCase;
pub use use_cases::stage_transition::{ControllerError, Evaluation, StageTransitionController};
pub use use_cases::views::{ChatStageView, ChatStageViews, ParticipantSummary, QuorumStatus};
