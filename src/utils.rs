// Shared timestamp and numeric helpers for the normalizer
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use polars::prelude::TimeUnit;

/// Canonical timestamp layout used for cutoffs, adjusted timestamps and output cells
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timezone operators read the current time in
pub const DISPLAY_TIMEZONE: Tz = chrono_tz::Asia::Singapore;

// Layouts seen in task report exports, tried in order
const LENIENT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a timestamp in the strict `YYYY-MM-DD HH:MM:SS` layout
pub fn parse_strict_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).ok()
}

/// Parse a report timestamp, accepting the layouts regional servers export
///
/// Date-only values are read as midnight.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    LENIENT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

pub fn format_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

/// Round to a fixed number of decimal places, ties to even
///
/// # Examples
///
/// ```
/// use cleaning_report_normalizer::utils::round_to;
///
/// assert_eq!(round_to(37.85411784, 4), 37.8541);
/// assert_eq!(round_to(9.290304, 3), 9.29);
/// assert_eq!(round_to(2.5, 0), 2.0);
/// ```
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round_ties_even() / factor
}

/// Microseconds since the Unix epoch, reading the naive value as UTC
pub fn to_epoch_micros(value: &NaiveDateTime) -> i64 {
    value.and_utc().timestamp_micros()
}

/// Inverse of [`to_epoch_micros`] for any polars time unit
pub fn from_epoch(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let utc = match unit {
        TimeUnit::Nanoseconds => Some(DateTime::<Utc>::from_timestamp_nanos(value)),
        TimeUnit::Microseconds => DateTime::<Utc>::from_timestamp_micros(value),
        TimeUnit::Milliseconds => DateTime::<Utc>::from_timestamp_millis(value),
    };
    utc.map(|dt| dt.naive_utc())
}

/// Convert a naive UTC timestamp into the given display timezone
pub fn to_display_time(utc: NaiveDateTime, tz: Tz) -> DateTime<Tz> {
    Utc.from_utc_datetime(&utc).with_timezone(&tz)
}

pub fn to_singapore_time(utc: NaiveDateTime) -> DateTime<Tz> {
    to_display_time(utc, DISPLAY_TIMEZONE)
}

/// Shift the local clock by a server's offset to get the timestamp stamped on every row
pub fn adjusted_timestamp(now: NaiveDateTime, offset_hours: i64) -> NaiveDateTime {
    let shifted = now + Duration::hours(offset_hours);
    // Output keeps whole seconds only
    shifted.with_nanosecond(0).unwrap_or(shifted)
}
