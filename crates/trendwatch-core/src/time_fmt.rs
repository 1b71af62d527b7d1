//! Display and freshness helpers for timestamps.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Render the first/last sighting of a title.
///
/// `"[08:00 ~ 10:30]"` when the two differ, `"08:00"` when they are equal
/// or only the first is known, and `""` when the first is unknown.
#[must_use]
pub fn format_time_display(first: Option<NaiveDateTime>, last: Option<NaiveDateTime>) -> String {
    let Some(first) = first else {
        return String::new();
    };
    let first = first.format("%H:%M").to_string();
    match last.map(|l| l.format("%H:%M").to_string()) {
        Some(last) if last != first => format!("[{first} ~ {last}]"),
        _ => first,
    }
}

/// Parse a feed timestamp. Offsets are honoured; naive values are read as UTC.
#[must_use]
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Whether `published` lies within `max_days` of `now`.
///
/// Filtering is disabled for `max_days <= 0`, and timestamps that are
/// missing or unparseable are kept.
#[must_use]
pub fn is_within_days(published: &str, max_days: i64, now: DateTime<Utc>) -> bool {
    if max_days <= 0 {
        return true;
    }
    let Some(published) = parse_published(published) else {
        return true;
    };
    now.signed_duration_since(published) <= TimeDelta::days(max_days)
}

/// `MM-DD HH:MM` for a feed timestamp, or `""` when it cannot be parsed.
#[must_use]
pub fn format_published(raw: &str) -> String {
    parse_published(raw)
        .map(|dt| dt.format("%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn time_display_range() {
        assert_eq!(
            format_time_display(Some(at(8, 0)), Some(at(10, 0))),
            "[08:00 ~ 10:00]"
        );
    }

    #[test]
    fn time_display_same_time() {
        assert_eq!(format_time_display(Some(at(8, 30)), Some(at(8, 30))), "08:30");
    }

    #[test]
    fn time_display_missing_first() {
        assert_eq!(format_time_display(None, Some(at(10, 0))), "");
    }

    #[test]
    fn time_display_missing_last() {
        assert_eq!(format_time_display(Some(at(8, 0)), None), "08:00");
    }

    #[test]
    fn within_days_disabled_for_non_positive_window() {
        assert!(is_within_days("2000-01-01T00:00:00Z", 0, now()));
        assert!(is_within_days("2000-01-01T00:00:00Z", -1, now()));
    }

    #[test]
    fn within_days_keeps_unparseable() {
        assert!(is_within_days("", 3, now()));
        assert!(is_within_days("yesterday-ish", 3, now()));
    }

    #[test]
    fn within_days_recent_and_old() {
        assert!(is_within_days("2025-01-14T12:00:00Z", 3, now()));
        assert!(!is_within_days("2025-01-01T12:00:00Z", 3, now()));
    }

    #[test]
    fn within_days_boundary_is_inclusive() {
        assert!(is_within_days("2025-01-14T12:00:00", 1, now()));
        assert!(!is_within_days("2025-01-14T11:59:59", 1, now()));
    }

    #[test]
    fn within_days_honours_offsets() {
        // 2025-01-12T20:00:00+08:00 is 2025-01-12T12:00:00Z, exactly three days old.
        assert!(is_within_days("2025-01-12T20:00:00+08:00", 3, now()));
        assert!(is_within_days("Sun, 12 Jan 2025 12:00:00 +0000", 3, now()));
    }

    #[test]
    fn published_formatting() {
        assert_eq!(format_published("2025-12-29T00:20:00Z"), "12-29 00:20");
        assert_eq!(format_published("2025-12-29 00:20:00.123"), "12-29 00:20");
        assert_eq!(format_published(""), "");
        assert_eq!(format_published("garbage"), "");
    }
}
