//! Calendar-day parsing and millisecond day bounds (UTC).

use crate::error::{DeskError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

pub const MS_PER_MINUTE: i64 = 60_000;
pub const MS_PER_DAY: i64 = 86_400_000;

/// Inclusive millisecond bounds of one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub start_ms: i64,
    pub end_ms: i64,
}

impl DayRange {
    pub fn of(date: NaiveDate) -> Self {
        let start_ms = start_of_day_ms(date);
        Self {
            start_ms,
            end_ms: start_ms + MS_PER_DAY - 1,
        }
    }
}

/// Parse an ISO-8601 date or date-time and keep its calendar day.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` and RFC 3339 timestamps.
pub fn parse_day(field: &'static str, raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc().date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.date());
    }
    Err(DeskError::invalid(
        field,
        format!("'{}' is not an ISO-8601 date", raw),
    ))
}

/// `00:00:00.000` of `date`, in epoch milliseconds.
pub fn start_of_day_ms(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// `23:59:59.999` of `date`, in epoch milliseconds.
pub fn end_of_day_ms(date: NaiveDate) -> i64 {
    start_of_day_ms(date) + MS_PER_DAY - 1
}

/// Calendar day (days since the epoch, UTC) containing `ms`.
pub fn utc_day(ms: i64) -> i64 {
    ms.div_euclid(MS_PER_DAY)
}

/// Whole minutes elapsed from `from` to `to`; 0 when either bound is missing
/// or the interval is negative.
pub fn elapsed_minutes(from: Option<i64>, to: Option<i64>) -> i64 {
    match (from, to) {
        (Some(from), Some(to)) if to > from => (to - from) / MS_PER_MINUTE,
        _ => 0,
    }
}
