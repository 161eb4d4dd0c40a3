//! Shared helpers for use cases.

/// Current time in milliseconds since epoch
pub(crate) fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}
