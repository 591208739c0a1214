//! Per-day counters of a Timecard.

use chrono::{Datelike, Duration, NaiveDateTime, Weekday};

use super::late_night::late_night_minutes;
use crate::models::{DailyCounters, OvertimePattern, OvertimePolicy, Timecard};

/// Absolute start/end of the shift described by a card.
///
/// Next-day flags move the respective time by one day; with neither flag set
/// an end at or before the start is read as an overnight shift.
pub fn shift_bounds(card: &Timecard) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let (start, end) = (card.start_time?, card.end_time?);

    let mut start_dt = card.work_date.and_time(start);
    if card.start_time_next_day {
        start_dt += Duration::days(1);
    }
    let mut end_dt = card.work_date.and_time(end);
    if card.end_time_next_day {
        end_dt += Duration::days(1);
    }
    if !card.start_time_next_day && !card.end_time_next_day && end_dt <= start_dt {
        end_dt += Duration::days(1);
    }

    Some((start_dt, end_dt))
}

pub fn is_weekend(card: &Timecard) -> bool {
    matches!(card.work_date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Compute the four daily counters. Non-working days and incomplete cards
/// produce all zeros.
pub fn compute_daily(card: &Timecard, pattern: Option<&OvertimePattern>) -> DailyCounters {
    if !card.work_type.is_work() {
        return DailyCounters::default();
    }
    let Some((start_dt, end_dt)) = shift_bounds(card) else {
        return DailyCounters::default();
    };

    let total = (end_dt - start_dt).num_minutes();
    let work_minutes = (total - card.break_minutes - card.late_night_break_minutes).max(0);

    let overtime_minutes = match pattern.map(|p| &p.policy) {
        Some(policy @ (OvertimePolicy::Premium { .. } | OvertimePolicy::Variable { .. })) => policy
            .daily_threshold_minutes()
            .map(|threshold| (work_minutes - threshold).max(0))
            .unwrap_or(0),
        Some(OvertimePolicy::MonthlyRange { .. } | OvertimePolicy::Flextime { .. }) | None => 0,
    };

    let late_night = if pattern.is_some_and(|p| p.calculate_midnight_premium) {
        (late_night_minutes(start_dt, end_dt) - card.late_night_break_minutes).max(0)
    } else {
        0
    };

    let holiday_work_minutes = if is_weekend(card) { work_minutes } else { 0 };

    DailyCounters {
        work_minutes,
        overtime_minutes,
        late_night_minutes: late_night,
        holiday_work_minutes,
    }
}
