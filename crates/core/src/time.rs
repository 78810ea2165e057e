use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};

/// Backing-file timestamp layout (`YYYY-MM-DD HH:MM`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Date-only layout accepted when reading older progress files.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A simple clock abstraction for deterministic time in services and tests.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    Default,
    Fixed(DateTime<Utc>),
}

impl Clock {
    /// Returns a clock that uses the current system time.
    #[must_use]
    pub fn default_clock() -> Self {
        Self::Default
    }

    /// Returns a clock fixed at the given timestamp.
    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    /// Returns the current time according to the clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::Default => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Current UTC time truncated to the precision stored in progress files.
    #[must_use]
    pub fn completion_stamp(&self) -> NaiveDateTime {
        truncate_to_minute(self.now())
    }
}

/// Drops seconds and sub-second precision.
#[must_use]
pub fn truncate_to_minute(at: DateTime<Utc>) -> NaiveDateTime {
    let naive = at.naive_utc();
    naive
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(naive)
}

#[must_use]
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Parse a stored completion timestamp.
///
/// Accepts `YYYY-MM-DD HH:MM` and the date-only `YYYY-MM-DD` (read as midnight).
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT) {
        return Some(at);
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Deterministic timestamp for tests and examples (2023-11-14T22:13:20Z).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic `DateTime<Utc>` for tests and doc examples.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
}

/// Returns a `Clock` fixed at the deterministic test timestamp.
#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_stamp_drops_seconds() {
        let stamp = fixed_clock().completion_stamp();
        assert_eq!(format_timestamp(stamp), "2023-11-14 22:13");
        assert_eq!(stamp.second(), 0);
    }

    #[test]
    fn parses_both_layouts() {
        let full = parse_timestamp("2025-03-01 04:30").unwrap();
        assert_eq!(format_timestamp(full), "2025-03-01 04:30");

        let date_only = parse_timestamp("2025-03-01").unwrap();
        assert_eq!(format_timestamp(date_only), "2025-03-01 00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("2025-13-01 00:00").is_none());
    }
}
