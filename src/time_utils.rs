// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};

/// Format a UTC timestamp the way the backend and stored sessions expect it
/// (RFC3339, millisecond precision, `Z` suffix).
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Drop sub-millisecond precision. Stored records only keep milliseconds,
/// so every timestamp taken from the backend goes through here.
pub fn truncate_to_millis(date: DateTime<Utc>) -> DateTime<Utc> {
    date.trunc_subsecs(3)
}

/// Parse user input as either a full RFC3339 timestamp or a bare
/// `YYYY-MM-DD` date (taken as midnight UTC).
pub fn parse_date_input(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Serde adapter writing timestamps through [`format_utc_rfc3339`].
pub mod iso {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_utc_rfc3339(*date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        DateTime::<Utc>::deserialize(d)
    }
}
