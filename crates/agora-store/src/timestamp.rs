//! Timestamps are stored as RFC 3339 UTC text with millisecond precision and
//! a `Z` suffix, so text order equals chronological order.

use chrono::{DateTime, Duration, SecondsFormat, SubsecRound, Utc};

pub(crate) fn to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Drop precision the store cannot keep, so records built in memory compare
/// equal to the ones read back.
pub(crate) fn normalize(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(3)
}

/// Smallest storable timestamp not earlier than `ts`.
pub(crate) fn round_up(ts: DateTime<Utc>) -> DateTime<Utc> {
    let truncated = normalize(ts);
    if truncated < ts {
        truncated + Duration::milliseconds(1)
    } else {
        truncated
    }
}

pub(crate) fn from_sql(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
