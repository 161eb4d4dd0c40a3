//! Identifier value objects
//!
//! # Identifiers
//! - [`ParticipantId`] - Stable identifier of a session participant
//! - [`SessionId`] - Identifier of a shared session document
//! - [`StageName`] - Name of a stage within a session

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(
    /// Unique, stable identifier of a participant.
    ///
    /// Ordering is lexicographic, which gives sessions a deterministic
    /// iteration order.
    ParticipantId
);

string_id!(
    /// Identifier of a session document.
    SessionId
);

string_id!(
    /// Name of a stage (e.g., "group-chat").
    StageName
);
