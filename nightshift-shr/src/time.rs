//  TIME.rs
//    by Lut99
//
//  Created:
//    06 Feb 2023, 10:21:36
//  Last edited:
//    04 Apr 2023, 14:02:51
//  Auto updated?
//    Yes
//
//  Description:
//!   Parses compact timespan strings (`1d2h3m4s`) and flexible date-time
//!   strings into `chrono` values.
//

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use lazy_static::lazy_static;
use regex::Regex;

pub use crate::errors::TimeError as Error;


/***** TESTS *****/





/***** CONSTANTS *****/
lazy_static! {
    /// Matches a compact timespan: every unit optional, at most once, in `d h m s` order.
    static ref TIMESPAN_REGEX: Regex = Regex::new(r"^(?:(?P<days>\d+)d)?(?:(?P<hours>\d+)h)?(?:(?P<minutes>\d+)m)?(?:(?P<seconds>\d+)s)?$").unwrap();
}

/// The date-time formats accepted by `parse_datetime`, tried in order.
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

/// The time-only formats accepted by `parse_datetime` (resolved to today), tried in order.
const TIME_FORMATS: [&str; 2] = [
    "%H:%M:%S",
    "%H:%M",
];





/***** LIBRARY *****/
/// Parses a compact timespan string (e.g., `1d2h3m4s`) into a Duration.
///
/// Every unit is optional but may occur at most once, and only in day/hour/minute/second order. The empty string parses as a zero duration.
///
/// # Arguments
/// - `raw`: The string to parse.
///
/// # Returns
/// The parsed timespan as a `chrono::Duration`.
///
/// # Errors
/// This function errors if the given string does not match the timespan grammar, or encodes a duration beyond what `chrono::Duration` can represent.
pub fn parse_timespan(raw: impl AsRef<str>) -> Result<Duration, Error> {
    let raw: &str = raw.as_ref();

    // Match against the grammar
    let caps = match TIMESPAN_REGEX.captures(raw) {
        Some(caps) => caps,
        None       => { return Err(Error::IllegalTimespan{ raw: raw.into() }); },
    };

    // The regex guarantees every captured group is all-digits; overflowing values are treated as illegal input.
    let value_of = |name: &str| -> Result<i64, Error> {
        match caps.name(name) {
            Some(m) => m.as_str().parse::<i64>().map_err(|_| Error::IllegalTimespan{ raw: raw.into() }),
            None    => Ok(0),
        }
    };

    // Units that exceed chrono's bounds (alone or summed) are illegal input, not a panic
    let illegal = || Error::IllegalTimespan{ raw: raw.into() };
    let mut total: Duration = Duration::try_days(value_of("days")?).ok_or_else(illegal)?;
    total = total.checked_add(&Duration::try_hours(value_of("hours")?).ok_or_else(illegal)?).ok_or_else(illegal)?;
    total = total.checked_add(&Duration::try_minutes(value_of("minutes")?).ok_or_else(illegal)?).ok_or_else(illegal)?;
    total = total.checked_add(&Duration::try_seconds(value_of("seconds")?).ok_or_else(illegal)?).ok_or_else(illegal)?;
    Ok(total)
}



/// Parses a flexible date-time string into a local timestamp.
///
/// Accepts `%Y-%m-%d %H:%M[:%S]` and `%d-%m-%Y %H:%M[:%S]`, as well as time-only strings (`%H:%M[:%S]`), which resolve to today.
///
/// # Arguments
/// - `raw`: The string to parse.
///
/// # Returns
/// The parsed moment, in the local timezone.
///
/// # Errors
/// This function errors if none of the recognized formats matched.
pub fn parse_datetime(raw: impl AsRef<str>) -> Result<DateTime<Local>, Error> {
    let raw: &str = raw.as_ref();

    // First, try the full date-time formats
    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            if let Some(dt) = Local.from_local_datetime(&naive).earliest() {
                return Ok(dt);
            }
        }
    }

    // Then the time-only ones, which resolve against today's date
    for fmt in TIME_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(raw, fmt) {
            let today: NaiveDate = Local::now().date_naive();
            if let Some(dt) = Local.from_local_datetime(&today.and_time(time)).earliest() {
                return Ok(dt);
            }
        }
    }

    Err(Error::IllegalDatetime{ raw: raw.into() })
}
