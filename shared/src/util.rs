//! Small shared helpers

/// Current Unix timestamp in milliseconds.
///
/// All persisted timestamps (creation, closure, audit entries, payments)
/// use this representation.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
