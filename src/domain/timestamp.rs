//! Timestamp parsing for table cells.
//!
//! Cells arrive either as spreadsheet serial dates (days since 1899-12-30,
//! fractional part = time of day) or as human-readable strings. Anything we
//! cannot read yields `None` and the row is dropped by the caller.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};

/// Serial day number of 1970-01-01.
const UNIX_EPOCH_SERIAL: f64 = 25569.0;
const SECS_PER_DAY: f64 = 86_400.0;

pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f %z",
    "%Y-%m-%d %H:%M:%S %z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%d-%m-%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y"];

/// Parse a cell into a UTC instant.
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if is_serial(value) {
        return parse_serial(value.parse().ok()?);
    }
    parse_text(value)
}

/// Non-negative decimal with at most one dot, e.g. `45567.5`.
fn is_serial(value: &str) -> bool {
    let mut dots = 0;
    let mut digits = 0;
    for c in value.chars() {
        match c {
            '.' => dots += 1,
            '0'..='9' => digits += 1,
            _ => return false,
        }
    }
    dots <= 1 && digits > 0
}

pub fn parse_serial(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() {
        return None;
    }
    let millis = ((serial - UNIX_EPOCH_SERIAL) * SECS_PER_DAY * 1000.0).round();
    Utc.timestamp_millis_opt(millis as i64).single()
}

fn parse_text(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    // Naive values carry no zone and are taken as UTC.
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(naive.and_utc());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }
    None
}

/// Fixed display offset, falling back to UTC for out-of-range values.
pub fn display_offset(minutes: i32) -> FixedOffset {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix())
}

pub fn format(ts: &DateTime<Utc>, offset: &FixedOffset) -> String {
    ts.with_timezone(offset).format(DISPLAY_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn serial_epoch_is_unix_epoch() {
        assert_eq!(parse("25569").map(|t| t.timestamp()), Some(0));
    }

    #[test]
    fn serial_fraction_is_time_of_day() {
        let ts = parse("25569.5").expect("serial parses");
        assert_eq!(ts.hour(), 12);
        assert_eq!(ts.minute(), 0);
    }

    #[test]
    fn textual_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap();
        assert_eq!(parse("2024-03-01 10:15:00"), Some(expected));
        assert_eq!(parse("2024-03-01T10:15:00Z"), Some(expected));
        assert_eq!(parse("2024-03-01T15:45:00+05:30"), Some(expected));
        assert_eq!(parse("2024/03/01 10:15:00"), Some(expected));
    }

    #[test]
    fn date_only_is_midnight_utc() {
        let ts = parse("2024-03-01").expect("date parses");
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn garbage_is_dropped() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse("yesterday-ish"), None);
        assert_eq!(parse("1.2.3"), None);
    }

    #[test]
    fn display_in_fixed_offset() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 10, 15, 0).unwrap();
        assert_eq!(format(&ts, &display_offset(330)), "2024-03-01 15:45:00");
        assert_eq!(format(&ts, &display_offset(0)), "2024-03-01 10:15:00");
    }

    #[test]
    fn out_of_range_offset_falls_back_to_utc() {
        assert_eq!(display_offset(i32::MAX), Utc.fix());
        assert_eq!(display_offset(i32::MIN), Utc.fix());
        assert_eq!(display_offset(24 * 60), Utc.fix());
    }
}
