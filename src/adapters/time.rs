//! Date handling shared by the calendar and contacts adapters.
//!
//! Dates cross the process boundary as `YYYY-MM-DDTHH:MM:SS` in local time.

use crate::osa::BridgeError;
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, Timelike};

pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Longest lookahead accepted for event queries
pub const MAX_LOOKAHEAD_DAYS: u32 = 3650;

const ACCEPTED_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always answers the same instant
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Lookahead window `[start, end]`, inclusive at both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// `[now, now + days]`, truncated to whole seconds
    pub fn lookahead(now: NaiveDateTime, days: u32) -> Result<Self, BridgeError> {
        if days > MAX_LOOKAHEAD_DAYS {
            return Err(BridgeError::invalid_parameter(
                "days",
                format!("must be at most {}, got {}", MAX_LOOKAHEAD_DAYS, days),
            ));
        }
        let start = now.with_nanosecond(0).unwrap_or(now);
        let end = start
            .checked_add_signed(Duration::days(i64::from(days)))
            .ok_or_else(|| {
                BridgeError::invalid_parameter("days", "window ends past the supported date range")
            })?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        instant >= self.start && instant <= self.end
    }
}

pub fn format_datetime(value: NaiveDateTime) -> String {
    value.format(ISO_FORMAT).to_string()
}

pub fn format_day(value: NaiveDate) -> String {
    value.format(DAY_FORMAT).to_string()
}

/// Parse a caller-supplied date-time; a bare date means midnight
pub fn parse_datetime(name: &str, value: &str) -> Result<NaiveDateTime, BridgeError> {
    let value = value.trim();
    for format in ACCEPTED_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }
    if let Ok(day) = NaiveDate::parse_from_str(value, DAY_FORMAT) {
        if let Some(midnight) = day.and_hms_opt(0, 0, 0) {
            return Ok(midnight);
        }
    }
    Err(BridgeError::invalid_parameter(
        name,
        format!("'{}' is not a date-time like 2026-10-19T09:30", value),
    ))
}

pub fn parse_day(name: &str, value: &str) -> Result<NaiveDate, BridgeError> {
    NaiveDate::parse_from_str(value.trim(), DAY_FORMAT).map_err(|_| {
        BridgeError::invalid_parameter(name, format!("'{}' is not a date like 1990-04-01", value))
    })
}
