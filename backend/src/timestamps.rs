//! Canonical timestamp handling.
//!
//! Every timestamp the service stores is UTC with millisecond precision and a `Z`
//! suffix (`2024-01-31T10:00:00.000Z`). With a single fixed-width format, string
//! order equals chronological order, which the range predicates rely on.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};

/// Which end of an inclusive range a calendar date stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Lower,
    Upper,
}

pub fn now() -> String {
    format(Utc::now())
}

pub fn format(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an RFC 3339 timestamp with any offset.
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|instant| instant.with_timezone(&Utc))
}

/// Normalizes an RFC 3339 timestamp into the canonical stored form.
pub fn normalize(value: &str) -> Option<String> {
    parse(value).map(format)
}

/// Parses a range bound given either as a full timestamp or as a calendar date.
///
/// A bare date covers the whole day: as a lower bound it means the first
/// millisecond of the day, as an upper bound the last one.
pub fn parse_bound(value: &str, bound: Bound) -> Option<String> {
    if let Some(normalized) = normalize(value) {
        return Some(normalized);
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
    let time = match bound {
        Bound::Lower => NaiveTime::from_hms_opt(0, 0, 0)?,
        Bound::Upper => NaiveTime::from_hms_milli_opt(23, 59, 59, 999)?,
    };
    Some(format(date.and_time(time).and_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_offsets_to_utc_millis() {
        assert_eq!(
            normalize("2024-03-01T12:00:00+02:00").as_deref(),
            Some("2024-03-01T10:00:00.000Z")
        );
        assert_eq!(normalize("yesterday"), None);
    }

    #[test]
    fn calendar_dates_cover_the_whole_day() {
        assert_eq!(
            parse_bound("2023-01-01", Bound::Lower).as_deref(),
            Some("2023-01-01T00:00:00.000Z")
        );
        assert_eq!(
            parse_bound("2023-01-31", Bound::Upper).as_deref(),
            Some("2023-01-31T23:59:59.999Z")
        );
        assert_eq!(parse_bound("2023-02-30", Bound::Upper), None);
    }

    #[test]
    fn canonical_strings_sort_chronologically() {
        let earlier = normalize("2023-01-31T23:59:59Z").unwrap();
        let later = normalize("2023-02-01T00:00:00.5Z").unwrap();
        assert!(earlier < later);
    }
}
