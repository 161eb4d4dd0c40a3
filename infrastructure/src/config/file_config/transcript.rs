//! Transcript configuration from TOML (`[transcript]` section)

use serde::{Deserialize, Serialize};
use stagegate_domain::{ConfigIssue, ConfigIssueCode, Severity};
use std::path::PathBuf;

/// Raw transcript configuration from TOML
///
/// ```toml
/// [transcript]
/// enabled = true
/// path = "stagegate-transcript.jsonl"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTranscriptConfig {
    /// Write a JSONL transcript of session events
    pub enabled: bool,
    /// Transcript file location
    pub path: String,
}

impl Default for FileTranscriptConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "stagegate-transcript.jsonl".to_string(),
        }
    }
}

impl FileTranscriptConfig {
    /// The transcript path when enabled and set
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if self.enabled && !self.path.trim().is_empty() {
            Some(PathBuf::from(self.path.trim()))
        } else {
            None
        }
    }

    pub(super) fn issues(&self) -> Vec<ConfigIssue> {
        if self.enabled && self.path.trim().is_empty() {
            vec![ConfigIssue {
                severity: Severity::Error,
                code: ConfigIssueCode::EmptyValue {
                    field: "transcript.path".to_string(),
                },
                message: "transcript.path: must be set when the transcript is enabled".to_string(),
            }]
        } else {
            vec![]
        }
    }
}
