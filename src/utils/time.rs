//! Time utilities: parsing HH:MM and wall-clock spans.

use crate::errors::{AppError, AppResult};
use chrono::NaiveTime;

pub fn parse_time(t: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(t.trim(), "%H:%M").ok()
}

/// Like [`parse_time`] but reports the offending input.
pub fn parse_time_strict(t: &str) -> AppResult<NaiveTime> {
    parse_time(t).ok_or_else(|| AppError::InvalidTime(t.to_string()))
}

/// Minutes from `start` to `end`, wrapping past midnight when `end <= start`.
pub fn minutes_between_wrapping(start: NaiveTime, end: NaiveTime) -> i64 {
    let diff = (end - start).num_minutes();
    if diff <= 0 { diff + 24 * 60 } else { diff }
}

pub fn parse_optional_time(input: Option<&str>) -> AppResult<Option<NaiveTime>> {
    input.map(parse_time_strict).transpose()
}

/// `#[serde(with = "serde_hhmm")]` for `NaiveTime` fields written as `HH:MM`.
pub mod serde_hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_time(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid time '{raw}', expected HH:MM")))
    }
}
