//! Input normalization
//!
//! This module turns loosely-typed submission values into canonical ones:
//! - Dates folded to `YYYY-MM-DD` calendar keys
//! - Prayer flags reduced to an on-time ratio
//! - Outcome ratings coerced into 1-5
//! - Clock strings parsed for bedtime comparison

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

/// Canonical prayer order
pub const PRAYERS: [&str; 5] = ["Fajr", "Dhuhr", "Asr", "Maghrib", "Isha"];

/// Outcome rating bounds
pub const RATING_MIN: u8 = 1;
pub const RATING_MAX: u8 = 5;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Result of normalizing a submitted date
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateKey {
    /// A real calendar date
    Calendar(NaiveDate),
    /// Not a recognizable date; kept verbatim (trimmed) as its own key
    Literal(String),
    /// Blank or absent
    Missing,
}

impl DateKey {
    /// The key used for grouping and sorting, `None` for missing dates
    pub fn as_key(&self) -> Option<String> {
        match self {
            DateKey::Calendar(date) => Some(date.format("%Y-%m-%d").to_string()),
            DateKey::Literal(raw) => Some(raw.clone()),
            DateKey::Missing => None,
        }
    }
}

/// Normalize a submitted date string.
///
/// Accepts plain dates in a few separators, ISO datetimes with or without an
/// offset (the calendar date as written is kept).
pub fn normalize_date(raw: &str) -> DateKey {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return DateKey::Missing;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return DateKey::Calendar(dt.date_naive());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return DateKey::Calendar(dt.date());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return DateKey::Calendar(date);
        }
    }

    DateKey::Literal(trimmed.to_string())
}

/// Fraction of the five prayers prayed on time
pub fn prayer_ratio(flags: [bool; 5]) -> f64 {
    let done = flags.iter().filter(|&&on_time| on_time).count();
    done as f64 / PRAYERS.len() as f64
}

/// Coerce a rating into 1..=5; fractional ratings are truncated.
pub fn clean_rating(value: f64) -> Option<u8> {
    if !value.is_finite() {
        return None;
    }
    let truncated = value.trunc().clamp(f64::from(RATING_MIN), f64::from(RATING_MAX));
    Some(truncated as u8)
}

/// Clamp negative and non-finite values to zero
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Parse a 24-hour clock string (`HH:MM`, optionally `HH:MM:SS`)
pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    let trimmed = value.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar(y: i32, m: u32, d: u32) -> DateKey {
        DateKey::Calendar(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_normalize_date_formats() {
        assert_eq!(normalize_date("2024-01-15"), calendar(2024, 1, 15));
        assert_eq!(normalize_date(" 2024/01/15 "), calendar(2024, 1, 15));
        assert_eq!(normalize_date("2024-01-15T22:10:00"), calendar(2024, 1, 15));
        assert_eq!(normalize_date("2024-01-15T23:30:00-05:00"), calendar(2024, 1, 15));
        assert_eq!(normalize_date("2024-01-15 08:00"), calendar(2024, 1, 15));
    }

    #[test]
    fn test_normalize_date_fallbacks() {
        assert_eq!(normalize_date(""), DateKey::Missing);
        assert_eq!(normalize_date("   "), DateKey::Missing);
        assert_eq!(
            normalize_date(" last friday "),
            DateKey::Literal("last friday".to_string())
        );
        assert_eq!(
            normalize_date("2024-02-30"),
            DateKey::Literal("2024-02-30".to_string())
        );
    }

    #[test]
    fn test_date_key_rendering() {
        assert_eq!(calendar(2024, 3, 9).as_key().as_deref(), Some("2024-03-09"));
        assert_eq!(DateKey::Missing.as_key(), None);
    }

    #[test]
    fn test_prayer_ratio() {
        assert_eq!(prayer_ratio([false; 5]), 0.0);
        assert_eq!(prayer_ratio([true; 5]), 1.0);
        assert!((prayer_ratio([true, false, true, false, false]) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_clean_rating() {
        assert_eq!(clean_rating(3.0), Some(3));
        assert_eq!(clean_rating(4.9), Some(4));
        assert_eq!(clean_rating(0.0), Some(1));
        assert_eq!(clean_rating(12.0), Some(5));
        assert_eq!(clean_rating(f64::NAN), None);
    }

    #[test]
    fn test_parse_clock() {
        assert_eq!(parse_clock("22:30"), NaiveTime::from_hms_opt(22, 30, 0));
        assert_eq!(parse_clock("06:05:30"), NaiveTime::from_hms_opt(6, 5, 30));
        assert_eq!(parse_clock("10pm"), None);
        assert_eq!(parse_clock("25:00"), None);
    }
}
