//! RFC-3339 timestamp helpers for store round-trips.
//!
//! All persisted timestamps are RFC-3339 UTC strings with millisecond
//! precision; all calendar math happens on [`DateTime<Utc>`]. Parsing is
//! strict: a string that does not carry an explicit offset is an error.

use anyhow::Context;
use chrono::{DateTime, SecondsFormat, Utc};

/// RFC-3339 with offset -> UTC.
///
/// Example: "2026-03-10T09:30:00-05:00" -> "2026-03-10T14:30:00Z".
pub fn parse_ts_to_utc(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let dt = DateTime::parse_from_rfc3339(s).with_context(|| format!("bad rfc3339: {s}"))?;
    Ok(dt.with_timezone(&Utc))
}

/// UTC -> RFC-3339 with millisecond precision and a trailing `Z`.
pub fn to_rfc3339_millis(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}
