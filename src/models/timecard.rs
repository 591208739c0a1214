use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use super::work_time::WorkTimeSlot;
use super::work_type::WorkType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Staff,
    Client,
}

impl Side {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Side::Staff => "staff",
            Side::Client => "client",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "staff" => Some(Side::Staff),
            "client" => Some(Side::Client),
            _ => None,
        }
    }
}

/// Key shared by Timecards and Timesheets of either side.
///
/// Staff side: `contract_id` is the staff contract. Client side:
/// `contract_id` is the client contract and `staff_id` tells which assigned
/// staff member the row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CardOwner {
    pub side: Side,
    pub contract_id: i64,
    pub staff_id: i64,
}

impl CardOwner {
    pub fn staff(staff_contract_id: i64, staff_id: i64) -> Self {
        Self {
            side: Side::Staff,
            contract_id: staff_contract_id,
            staff_id,
        }
    }

    pub fn client(client_contract_id: i64, staff_id: i64) -> Self {
        Self {
            side: Side::Client,
            contract_id: client_contract_id,
            staff_id,
        }
    }
}

impl fmt::Display for CardOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}/staff:{}",
            self.side.to_db_str(),
            self.contract_id,
            self.staff_id
        )
    }
}

/// Derived per-day minute counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailyCounters {
    pub work_minutes: i64,
    pub overtime_minutes: i64,
    pub late_night_minutes: i64,
    pub holiday_work_minutes: i64,
}

/// Daily attendance row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timecard {
    pub id: i64,
    pub owner: CardOwner,
    pub work_date: NaiveDate,
    pub work_type: WorkType,
    pub work_time_slot: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub start_time_next_day: bool,
    pub end_time: Option<NaiveTime>,
    pub end_time_next_day: bool,
    pub break_minutes: i64,
    pub late_night_break_minutes: i64,
    pub paid_leave_days: Decimal,
    pub memo: Option<String>,
    pub counters: DailyCounters,
}

impl Timecard {
    /// Empty card; `id = 0` means "not stored yet".
    pub fn new(owner: CardOwner, work_date: NaiveDate, work_type: WorkType) -> Self {
        Self {
            id: 0,
            owner,
            work_date,
            work_type,
            work_time_slot: None,
            start_time: None,
            start_time_next_day: false,
            end_time: None,
            end_time_next_day: false,
            break_minutes: 0,
            late_night_break_minutes: 0,
            paid_leave_days: Decimal::ZERO,
            memo: None,
            counters: DailyCounters::default(),
        }
    }

    /// Convenience constructor for a plain working day.
    pub fn work(
        owner: CardOwner,
        work_date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        break_minutes: i64,
    ) -> Self {
        let mut card = Self::new(owner, work_date, WorkType::Work);
        card.start_time = Some(start);
        card.end_time = Some(end);
        card.end_time_next_day = end <= start;
        card.break_minutes = break_minutes;
        card
    }

    /// Prefill times and breaks from a work-time slot.
    pub fn apply_slot(&mut self, slot: &WorkTimeSlot) {
        self.work_time_slot = Some(slot.name.clone());
        self.start_time = Some(slot.start_time);
        self.start_time_next_day = false;
        self.end_time = Some(slot.end_time);
        self.end_time_next_day = slot.ends_next_day();
        self.break_minutes = slot.break_minutes();
    }
}
