//! Column conversion helpers shared by the query modules.
//!
//! Dates are stored as `YYYY-MM-DD`, times of day as `HH:MM`, instants as
//! RFC 3339 with offset, decimals as text.

use chrono::{DateTime, NaiveDate, NaiveTime};
use rusqlite::Row;
use rusqlite::types::Type;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::errors::AppError;
use crate::models::{Location, Timestamp};

pub fn conversion_error(err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(err))
}

pub fn date_to_db(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

pub fn time_to_db(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

pub fn ts_to_db(ts: &Timestamp) -> String {
    ts.to_rfc3339()
}

pub fn get_date(row: &Row, col: &str) -> rusqlite::Result<NaiveDate> {
    let raw: String = row.get(col)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|_| conversion_error(AppError::InvalidDate(raw.clone())))
}

pub fn get_opt_date(row: &Row, col: &str) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(col)?;
    raw.map(|s| {
        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map_err(|_| conversion_error(AppError::InvalidDate(s.clone())))
    })
    .transpose()
}

pub fn get_opt_time(row: &Row, col: &str) -> rusqlite::Result<Option<NaiveTime>> {
    let raw: Option<String> = row.get(col)?;
    raw.map(|s| {
        NaiveTime::parse_from_str(&s, "%H:%M")
            .map_err(|_| conversion_error(AppError::InvalidTime(s.clone())))
    })
    .transpose()
}

pub fn get_ts(row: &Row, col: &str) -> rusqlite::Result<Timestamp> {
    let raw: String = row.get(col)?;
    DateTime::parse_from_rfc3339(&raw)
        .map_err(|_| conversion_error(AppError::InvalidTime(raw.clone())))
}

pub fn get_opt_ts(row: &Row, col: &str) -> rusqlite::Result<Option<Timestamp>> {
    let raw: Option<String> = row.get(col)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map_err(|_| conversion_error(AppError::InvalidTime(s.clone())))
    })
    .transpose()
}

pub fn get_decimal(row: &Row, col: &str) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(col)?;
    Decimal::from_str(&raw).map_err(|_| {
        conversion_error(AppError::ConstraintViolated(format!(
            "invalid decimal '{raw}' in {col}"
        )))
    })
}

/// Reads `<prefix>_lat`, `<prefix>_lon`, `<prefix>_address`.
pub fn get_location(row: &Row, prefix: &str) -> rusqlite::Result<Option<Location>> {
    let lat: Option<f64> = row.get(format!("{prefix}_lat").as_str())?;
    let lon: Option<f64> = row.get(format!("{prefix}_lon").as_str())?;
    let address: Option<String> = row.get(format!("{prefix}_address").as_str())?;
    Ok(match (lat, lon) {
        (Some(lat), Some(lon)) => Some(Location { lat, lon, address }),
        _ => None,
    })
}

/// `(lat, lon, address)` columns for an optional location.
pub fn location_cols(loc: Option<&Location>) -> (Option<f64>, Option<f64>, Option<String>) {
    match loc {
        Some(l) => (Some(l.lat), Some(l.lon), l.address.clone()),
        None => (None, None, None),
    }
}

pub fn bool_to_db(b: bool) -> i64 {
    i64::from(b)
}

pub fn get_bool(row: &Row, col: &str) -> rusqlite::Result<bool> {
    Ok(row.get::<_, i64>(col)? != 0)
}
