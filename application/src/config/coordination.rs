//! Coordination parameters for the transition controller and derived views.

use serde::{Deserialize, Serialize};
use stagegate_domain::MissingStatePolicy;

/// Parameters shared by the chat-stage use case and the transition
/// controller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinationConfig {
    /// What to do when a cohort member has no state for the stage
    pub missing_state: MissingStatePolicy,
}

impl CoordinationConfig {
    // ==================== Builder Methods ====================

    pub fn with_missing_state(mut self, policy: MissingStatePolicy) -> Self {
        self.missing_state = policy;
        self
    }
}
