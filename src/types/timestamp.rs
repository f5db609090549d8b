//! Timestamp type for the Rust Settlement Engine
//!
//! A `Timestamp` is a point in time expressed in seconds since the unix epoch,
//! extended with two sentinels so that intervals can be open on either side.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use std::fmt;

/// Point in time with infinite sentinels
///
/// Variant order is load-bearing: the derived `Ord` sorts `MinusInfinity`
/// before every finite instant and `PlusInfinity` after every finite instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Timestamp {
    /// Since before any record
    MinusInfinity,

    /// Seconds since the unix epoch
    At(i64),

    /// Still ongoing / open
    PlusInfinity,
}

impl Timestamp {
    /// Seconds since the epoch, or `None` for a sentinel
    pub fn as_secs(self) -> Option<i64> {
        match self {
            Timestamp::At(secs) => Some(secs),
            Timestamp::MinusInfinity | Timestamp::PlusInfinity => None,
        }
    }

    /// Number of seconds from `earlier` to `self`
    ///
    /// # Returns
    ///
    /// * `Some(seconds)` - If both endpoints are finite and the difference fits in an i64
    /// * `None` - If either endpoint is a sentinel or the subtraction overflows
    pub fn seconds_since(self, earlier: Timestamp) -> Option<i64> {
        self.as_secs()?.checked_sub(earlier.as_secs()?)
    }

    /// Parse a timestamp from a log field
    ///
    /// Accepts unix seconds (`1704067200`, `-3600`), a date (`2024-01-01`)
    /// or a date and time (`2024-01-01T12:30:00`). Dates are read as UTC.
    ///
    /// # Returns
    ///
    /// * `Some(Timestamp::At(_))` - If the field is in one of the accepted formats
    /// * `None` - Otherwise
    pub fn parse(field: &str) -> Option<Timestamp> {
        let field = field.trim();

        if let Ok(secs) = field.parse::<i64>() {
            return Some(Timestamp::At(secs));
        }

        if let Ok(datetime) = NaiveDateTime::parse_from_str(field, "%Y-%m-%dT%H:%M:%S") {
            return Some(Timestamp::At(datetime.and_utc().timestamp()));
        }

        NaiveDate::parse_from_str(field, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|datetime| Timestamp::At(datetime.and_utc().timestamp()))
    }
}

impl fmt::Display for Timestamp {
    /// Dates at midnight print as `YYYY-MM-DD`, other instants as
    /// `YYYY-MM-DDTHH:MM:SS`, sentinels as `-inf` / `inf`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::MinusInfinity => write!(f, "-inf"),
            Timestamp::PlusInfinity => write!(f, "inf"),
            Timestamp::At(secs) => match DateTime::from_timestamp(*secs, 0) {
                Some(datetime) => {
                    let time = datetime.time();
                    if time.hour() == 0 && time.minute() == 0 && time.second() == 0 {
                        write!(f, "{}", datetime.format("%Y-%m-%d"))
                    } else {
                        write!(f, "{}", datetime.format("%Y-%m-%dT%H:%M:%S"))
                    }
                }
                None => write!(f, "{}", secs),
            },
        }
    }
}
