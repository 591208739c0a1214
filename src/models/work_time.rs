use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::utils::time::{minutes_between_wrapping, serde_hhmm};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotBreak {
    #[serde(with = "serde_hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "serde_hhmm")]
    pub end_time: NaiveTime,
}

/// One named shift inside a pattern ("day shift", "night shift", ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkTimeSlot {
    pub name: String,
    #[serde(with = "serde_hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "serde_hhmm")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub breaks: Vec<SlotBreak>,
}

impl WorkTimeSlot {
    /// Slots ending at or before their start run into the next day.
    pub fn ends_next_day(&self) -> bool {
        self.end_time <= self.start_time
    }

    pub fn break_minutes(&self) -> i64 {
        self.breaks
            .iter()
            .map(|b| minutes_between_wrapping(b.start_time, b.end_time))
            .sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkTimePattern {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub slots: Vec<WorkTimeSlot>,
}

impl WorkTimePattern {
    pub fn slot(&self, name: &str) -> Option<&WorkTimeSlot> {
        self.slots.iter().find(|s| s.name == name)
    }
}
