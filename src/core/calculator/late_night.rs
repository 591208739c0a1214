//! Late-night interval: wall-clock `[22:00, 05:00)` of every night.

use chrono::{Duration, NaiveDateTime, NaiveTime};

const NIGHT_START_HOURS: i64 = 22;
const NIGHT_END_HOURS: i64 = 24 + 5;

/// Minutes of `[start, end)` that fall inside a late-night window.
///
/// Each night `d` contributes `[d 22:00, d+1 05:00)`; the night of the day
/// before `start` is included so that early-morning starts are counted.
pub fn late_night_minutes(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    if end <= start {
        return 0;
    }

    let first_night = start.date().pred_opt().unwrap_or(start.date());
    let last_night = end.date();

    first_night
        .iter_days()
        .take_while(|d| *d <= last_night)
        .map(|day| {
            let midnight = day.and_time(NaiveTime::MIN);
            let window_start = midnight + Duration::hours(NIGHT_START_HOURS);
            let window_end = midnight + Duration::hours(NIGHT_END_HOURS);
            let from = start.max(window_start);
            let to = end.min(window_end);
            if to > from { (to - from).num_minutes() } else { 0 }
        })
        .sum()
}

/// Late-night minutes of several intervals (e.g. the breaks of a day).
pub fn late_night_minutes_of<I>(intervals: I) -> i64
where
    I: IntoIterator<Item = (NaiveDateTime, NaiveDateTime)>,
{
    intervals
        .into_iter()
        .map(|(s, e)| late_night_minutes(s, e))
        .sum()
}
