use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime};
use regex::Regex;

static RE_LOOSE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})").unwrap());
static RE_COMPACT_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})(\d{2})(\d{2})$").unwrap());

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp from the tracker into a calendar date.
///
/// Accepts, in order:
/// - RFC 3339 / ISO-8601 with offset (`2023-06-15T10:00:00.000Z`); the date is
///   taken in the timestamp's own offset
/// - naive ISO-8601 date-times (`2023-06-15T10:00:00`, `2023-06-15 10:00`)
/// - loose date-only strings (`2023-06-15`, `2023/6/5`, `2023.06.15`, `20230615`),
///   ignoring anything after the date part
///
/// Returns `None` when nothing matches or the date does not exist.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    let caps = RE_LOOSE_DATE
        .captures(s)
        .or_else(|| RE_COMPACT_DATE.captures(s))?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Subtract `n` calendar months, clamping to the end of shorter months
/// (e.g. Aug 31 minus 6 months is Feb 28/29).
pub fn months_before(date: NaiveDate, n: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(n))
        .unwrap_or(NaiveDate::MIN)
}

/// Get the quarter (1-4) for a given date.
pub fn quarter_of(d: NaiveDate) -> u8 {
    ((d.month() - 1) / 3 + 1) as u8
}

/// The (year, month) that lies `back` calendar months before the given one.
pub fn shift_month(year: i32, month: u32, back: u32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Canonical month key: `2023-06`.
pub fn month_key(year: i32, month: u32) -> String {
    format!("{year}-{month:02}")
}

/// Human month label: `June 2023`.
pub fn month_label(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_else(|| month_key(year, month))
}
