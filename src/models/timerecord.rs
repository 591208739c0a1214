use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

pub type Timestamp = DateTime<FixedOffset>;

/// Where a punch happened. The address is filled in by the geocoder and may
/// stay empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerecordBreak {
    pub id: i64,
    pub timerecord_id: i64,
    pub break_start: Timestamp,
    pub break_end: Option<Timestamp>,
    pub rounded_break_start: Timestamp,
    pub rounded_break_end: Option<Timestamp>,
    pub start_location: Option<Location>,
    pub end_location: Option<Location>,
}

impl TimerecordBreak {
    pub fn is_open(&self) -> bool {
        self.break_end.is_none()
    }

    /// Rounded duration in minutes, 0 while the break is still open.
    pub fn rounded_minutes(&self) -> i64 {
        self.rounded_break_end
            .map(|end| (end - self.rounded_break_start).num_minutes().max(0))
            .unwrap_or(0)
    }
}

/// Raw punch record of one staff contract on one work date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timerecord {
    pub id: i64,
    pub staff_id: i64,
    pub staff_contract_id: i64,
    pub work_date: NaiveDate,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub rounded_start_time: Timestamp,
    pub rounded_end_time: Option<Timestamp>,
    pub start_location: Option<Location>,
    pub end_location: Option<Location>,
    pub memo: Option<String>,
    pub breaks: Vec<TimerecordBreak>,
}

impl Timerecord {
    /// A record is open until either the raw or the rounded end is set.
    pub fn is_open(&self) -> bool {
        self.end_time.is_none() && self.rounded_end_time.is_none()
    }

    pub fn open_break(&self) -> Option<&TimerecordBreak> {
        self.breaks.iter().find(|b| b.is_open())
    }

    pub fn total_break_minutes(&self) -> i64 {
        self.breaks.iter().map(TimerecordBreak::rounded_minutes).sum()
    }

    /// Rounded span minus closed breaks; 0 while the record is open.
    pub fn total_work_minutes(&self) -> i64 {
        match self.rounded_end_time {
            Some(end) => {
                let span = (end - self.rounded_start_time).num_minutes();
                (span - self.total_break_minutes()).max(0)
            }
            None => 0,
        }
    }
}
