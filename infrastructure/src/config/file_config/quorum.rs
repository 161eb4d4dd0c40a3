//! Quorum configuration from TOML (`[quorum]` section)

use serde::{Deserialize, Serialize};
use stagegate_domain::{ConfigIssue, ConfigIssueCode, MissingStatePolicy, Severity};

/// Raw quorum configuration from TOML
///
/// # Example
///
/// ```toml
/// [quorum]
/// missing_state = "not_quorate"   # "not_quorate" or "propagate"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileQuorumConfig {
    /// What to do when a cohort member has no state for the stage
    pub missing_state: String,
}

impl Default for FileQuorumConfig {
    fn default() -> Self {
        Self {
            missing_state: MissingStatePolicy::default().as_str().to_string(),
        }
    }
}

impl FileQuorumConfig {
    /// Parse missing_state into a policy, returning warnings on failure.
    ///
    /// Accepts: "not_quorate", "not-quorate", "propagate"
    pub fn parse_missing_state(&self) -> (MissingStatePolicy, Vec<ConfigIssue>) {
        match self.missing_state.parse::<MissingStatePolicy>() {
            Ok(policy) => (policy, vec![]),
            Err(_) => {
                let issue = ConfigIssue {
                    severity: Severity::Warning,
                    code: ConfigIssueCode::InvalidEnumValue {
                        field: "quorum.missing_state".to_string(),
                        value: self.missing_state.clone(),
                        valid_values: vec!["not_quorate".to_string(), "propagate".to_string()],
                    },
                    message: format!(
                        "quorum.missing_state: unknown value '{}', falling back to 'not_quorate'",
                        self.missing_state
                    ),
                };
                (MissingStatePolicy::default(), vec![issue])
            }
        }
    }
}
