//! Configuration file loading for stagegate
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./stagegate.toml` or `./.stagegate.toml`
//! 3. XDG config: `$XDG_CONFIG_HOME/stagegate/config.toml`
//! 4. Default values

mod file_config;
mod loader;

pub use file_config::{FileConfig, FileLogConfig, FileQuorumConfig, FileTranscriptConfig};
pub use loader::ConfigLoader;
