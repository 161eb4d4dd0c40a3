//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Enum-like fields stay as strings here and are parsed (with issues
//! reported) when converted to application config.

mod log;
mod quorum;
mod transcript;

pub use log::FileLogConfig;
pub use quorum::FileQuorumConfig;
pub use transcript::FileTranscriptConfig;

use serde::{Deserialize, Serialize};
use stagegate_application::CoordinationConfig;
use stagegate_domain::ConfigIssue;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Readiness quorum settings
    pub quorum: FileQuorumConfig,
    /// JSONL transcript settings
    pub transcript: FileTranscriptConfig,
    /// Operation log settings
    pub log: FileLogConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.quorum.parse_missing_state().1);
        issues.extend(self.transcript.issues());
        issues
    }

    /// Convert to the application's coordination parameters. Unknown values
    /// fall back to defaults; `validate` reports them.
    pub fn to_coordination_config(&self) -> CoordinationConfig {
        let (policy, _) = self.quorum.parse_missing_state();
        CoordinationConfig::default().with_missing_state(policy)
    }
}
