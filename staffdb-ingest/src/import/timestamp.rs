//! Hire timestamp parsing
//!
//! A single trailing `Z` is dropped before parsing and carries no meaning;
//! the stored value is the wall-clock time as written. Offsets such as
//! `+02:00` are not accepted.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Byte length of a `YYYY-MM-DD` date
const DATE_LEN: usize = 10;

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Remove one literal trailing `Z`
pub fn strip_zulu_suffix(raw: &str) -> &str {
    raw.strip_suffix('Z').unwrap_or(raw)
}

/// Parse an ISO-8601 style local timestamp
///
/// The date may be followed by any single separator character and a time
/// of `HH`, `HH:MM` or `HH:MM:SS[.fraction]`. A bare date is taken as
/// midnight.
pub fn parse_hired_at(value: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(value.get(..DATE_LEN)?, DATE_FORMAT).ok()?;

    let mut rest = value[DATE_LEN..].chars();
    if rest.next().is_none() {
        return date.and_hms_opt(0, 0, 0);
    }

    parse_time(rest.as_str()).map(|time| date.and_time(time))
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    // chrono cannot parse an hour without minutes
    if value.len() == 2 && value.bytes().all(|b| b.is_ascii_digit()) {
        return NaiveTime::from_hms_opt(value.parse().ok()?, 0, 0);
    }

    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(value, format).ok())
}
