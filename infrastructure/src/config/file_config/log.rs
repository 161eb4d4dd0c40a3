//! Operation log configuration from TOML (`[log]` section)

use serde::{Deserialize, Serialize};

/// Raw log configuration from TOML
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLogConfig {
    /// Emit tracing output as JSON lines instead of human-readable text
    pub json: bool,
}
