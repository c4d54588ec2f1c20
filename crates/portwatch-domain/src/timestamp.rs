use chrono::{DateTime, NaiveDateTime, Utc};

/// Resolve a caller-supplied timestamp string, falling back to `fallback`
/// (ingestion wall-clock time) when the input is absent or unparsable.
///
/// Accepted encodings, in order:
/// - a digit-only string is whole UNIX seconds;
/// - an ISO-8601 string, where a trailing `Z` means UTC and a naive
///   timestamp is taken as UTC;
/// - anything else falls back silently. The fallback is a deliberate
///   recovery policy, never an error.
pub fn resolve(input: Option<&str>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = input else {
        return fallback;
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return fallback;
    }

    if raw.bytes().all(|b| b.is_ascii_digit()) {
        return match raw.parse::<i64>().ok().and_then(unix_seconds) {
            Some(t) => t,
            None => fallback,
        };
    }

    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return t.with_timezone(&Utc);
    }

    // Naive ISO-8601 without an offset, e.g. "2024-01-01T00:00:00".
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_utc();
    }

    fallback
}

/// UNIX seconds to an instant, `None` when out of chrono's range.
pub fn unix_seconds(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fallback() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn digit_string_is_unix_seconds() {
        let t = resolve(Some("1700000000"), fallback());
        assert_eq!(t.timestamp(), 1_700_000_000);
    }

    #[test]
    fn trailing_z_is_utc() {
        let t = resolve(Some("2024-01-01T00:00:00Z"), fallback());
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn explicit_offset_is_converted() {
        let t = resolve(Some("2024-01-01T05:00:00+05:00"), fallback());
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn naive_iso_is_taken_as_utc() {
        let t = resolve(Some("2024-01-01T00:00:00"), fallback());
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn garbage_falls_back_to_ingestion_time() {
        assert_eq!(resolve(Some("not-a-date"), fallback()), fallback());
    }

    #[test]
    fn absent_and_empty_fall_back() {
        assert_eq!(resolve(None, fallback()), fallback());
        assert_eq!(resolve(Some("  "), fallback()), fallback());
    }
}
