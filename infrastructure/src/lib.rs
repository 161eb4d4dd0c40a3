//! Infrastructure layer for stagegate
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod progression;

// Re-export commonly used types
pub use config::{
    ConfigLoader, FileConfig, FileLogConfig, FileQuorumConfig, FileTranscriptConfig,
};
pub use logging::JsonlTranscriptLogger;
pub use progression::SessionStageProgression;
