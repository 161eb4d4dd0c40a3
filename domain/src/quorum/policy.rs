//! Policy for cohort members without stage state

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// How a caller treats [`DomainError::MissingStageState`] from the aggregator
///
/// # Example
///
/// ```
/// use stagegate_domain::quorum::MissingStatePolicy;
///
/// let policy: MissingStatePolicy = "propagate".parse().unwrap();
/// assert_eq!(policy, MissingStatePolicy::Propagate);
/// assert_eq!(MissingStatePolicy::default(), MissingStatePolicy::NotQuorate);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingStatePolicy {
    /// Treat the cohort as not yet quorate
    #[default]
    NotQuorate,
    /// Hand the error to the caller
    Propagate,
}

impl MissingStatePolicy {
    /// Apply the policy to an aggregator result. Other errors always pass
    /// through.
    pub fn apply(&self, result: Result<bool, DomainError>) -> Result<bool, DomainError> {
        match (self, result) {
            (MissingStatePolicy::NotQuorate, Err(e)) if e.is_missing_stage_state() => Ok(false),
            (_, result) => result,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MissingStatePolicy::NotQuorate => "not_quorate",
            MissingStatePolicy::Propagate => "propagate",
        }
    }
}

impl std::fmt::Display for MissingStatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MissingStatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "not_quorate" => Ok(MissingStatePolicy::NotQuorate),
            "propagate" => Ok(MissingStatePolicy::Propagate),
            _ => Err(format!(
                "Unknown missing-state policy: {}. Valid: not_quorate, propagate",
                s
            )),
        }
    }
}
