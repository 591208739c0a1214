//! Punch rounding.
//!
//! Seconds and sub-seconds count proportionally towards the minute, the
//! result always has zero seconds and keeps the input offset.

use chrono::{Duration, Timelike};

use crate::models::{RoundingMethod, RoundingRule, TimePunchConfig, Timestamp};

const NANOS_PER_MINUTE: i64 = 60 * 1_000_000_000;

/// Which punch a timestamp belongs to, to pick the matching rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchKind {
    Start,
    End,
    BreakStart,
    BreakEnd,
}

/// Drop seconds and sub-seconds.
pub fn truncate_seconds(ts: Timestamp) -> Timestamp {
    ts - Duration::seconds(i64::from(ts.second())) - Duration::nanoseconds(i64::from(ts.nanosecond()))
}

/// Round `ts` to a multiple of `unit_minutes` within its hour.
///
/// A rounded minute of 60 or more carries into the hour (and the date).
pub fn round_time(ts: Timestamp, unit_minutes: u32, method: RoundingMethod) -> Timestamp {
    if unit_minutes <= 1 {
        return truncate_seconds(ts);
    }

    let into_hour = Duration::seconds(i64::from(ts.minute() * 60 + ts.second()))
        + Duration::nanoseconds(i64::from(ts.nanosecond()));
    let hour_start = ts - into_hour;

    // at most one hour of nanoseconds, no overflow
    let offset = into_hour.num_nanoseconds().unwrap_or(0);
    let unit = i64::from(unit_minutes) * NANOS_PER_MINUTE;

    let steps = match method {
        RoundingMethod::Floor => offset / unit,
        RoundingMethod::Ceil => (offset + unit - 1) / unit,
        RoundingMethod::Round => (2 * offset + unit) / (2 * unit),
    };

    hour_start + Duration::minutes(steps * i64::from(unit_minutes))
}

pub fn apply_rule(ts: Timestamp, rule: RoundingRule) -> Timestamp {
    round_time(ts, rule.unit, rule.method)
}

/// Canonical value stored next to a raw punch.
///
/// Break punches are kept verbatim when the config disables break input.
/// Without any config the raw value is kept as well.
pub fn round_punch(cfg: Option<&TimePunchConfig>, kind: PunchKind, ts: Timestamp) -> Timestamp {
    let Some(cfg) = cfg else {
        return ts;
    };
    match kind {
        PunchKind::Start => apply_rule(ts, cfg.start),
        PunchKind::End => apply_rule(ts, cfg.end),
        PunchKind::BreakStart if cfg.break_input => apply_rule(ts, cfg.break_start),
        PunchKind::BreakEnd if cfg.break_input => apply_rule(ts, cfg.break_end),
        PunchKind::BreakStart | PunchKind::BreakEnd => ts,
    }
}
