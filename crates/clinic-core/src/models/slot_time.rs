//! Date/time exchange formats for appointment slots.
//!
//! Dates travel as `dd/MM/yy` and times as `HH:mm`, every field zero-padded.
//! Two-digit years land in 2000-2099. Slot creation additionally requires the
//! minute to sit on a 30-minute boundary; reads never re-check it.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use thiserror::Error;

/// Exchange format for dates (e.g. `25/12/24`).
pub const DATE_FORMAT: &str = "%d/%m/%y";

/// Exchange format for times (e.g. `14:30`).
pub const TIME_FORMAT: &str = "%H:%M";

/// Slot granularity in minutes.
pub const SLOT_MINUTES: u32 = 30;

/// Slot date/time parsing errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SlotTimeError {
    #[error("Invalid date '{0}', expected dd/MM/yy (e.g. 25/12/24)")]
    Date(String),

    #[error("Invalid time '{0}', expected HH:mm (e.g. 14:30)")]
    Time(String),

    #[error("Time {0} is not on a 30-minute boundary (use :00 or :30)")]
    Granularity(String),
}

/// Parse a `dd/MM/yy` date into the 2000-2099 century.
pub fn parse_date(input: &str) -> Result<NaiveDate, SlotTimeError> {
    let trimmed = input.trim();
    // chrono accepts unpadded day and month; the exchange format does not
    if trimmed.len() != 8 {
        return Err(SlotTimeError::Date(input.to_string()));
    }
    let parsed = NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| SlotTimeError::Date(input.to_string()))?;
    // %y puts 69-99 in the 1900s
    if parsed.year() < 2000 {
        return parsed
            .with_year(parsed.year() + 100)
            .ok_or_else(|| SlotTimeError::Date(input.to_string()));
    }
    Ok(parsed)
}

/// Parse an `HH:mm` time. Any minute value is accepted.
pub fn parse_time(input: &str) -> Result<NaiveTime, SlotTimeError> {
    let trimmed = input.trim();
    // chrono accepts single-digit hours; the exchange format does not
    if trimmed.len() != 5 {
        return Err(SlotTimeError::Time(input.to_string()));
    }
    NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
        .map_err(|_| SlotTimeError::Time(input.to_string()))
}

/// Parse an `HH:mm` time that must start a slot.
pub fn parse_slot_time(input: &str) -> Result<NaiveTime, SlotTimeError> {
    let time = parse_time(input)?;
    if time.minute() % SLOT_MINUTES != 0 {
        return Err(SlotTimeError::Granularity(format_time(&time)));
    }
    Ok(time)
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: &NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Serde adapter for `dd/MM/yy` dates.
pub mod date_format {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_date(date))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for `HH:mm` times.
pub mod time_format {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_time(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).map_err(serde::de::Error::custom)
    }
}
