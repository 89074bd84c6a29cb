use chrono::{SecondsFormat, Utc};

pub fn current_timestamp() -> i64 {
    Utc::now().timestamp()
}

/// UTC timestamp in RFC 3339 form, the format used for all stored
/// date columns
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
