use chrono::Duration;

mod common;
use common::{d, late_night_walk, ndt, premium_8h, staff_owner, t};

use rkintai::core::calculator::late_night::late_night_minutes_of;
use rkintai::core::calculator::{compute_daily, late_night_minutes, shift_bounds};
use rkintai::models::{HourMinute, OvertimePattern, OvertimePolicy, Timecard, WorkType};

fn pattern(policy: OvertimePolicy, midnight: bool) -> OvertimePattern {
    OvertimePattern {
        id: 1,
        name: "p".into(),
        calculate_midnight_premium: midnight,
        policy,
    }
}

#[test]
fn test_premium_weekday_with_overtime() {
    // 2025-01-15 is a Wednesday
    let card = Timecard::work(staff_owner(), d("2025-01-15"), t("09:00"), t("19:00"), 60);
    let c = compute_daily(&card, Some(&pattern(premium_8h(), true)));
    assert_eq!(c.work_minutes, 540);
    assert_eq!(c.overtime_minutes, 60);
    assert_eq!(c.late_night_minutes, 0);
    assert_eq!(c.holiday_work_minutes, 0);
}

#[test]
fn test_threshold_with_minutes() {
    let policy = OvertimePolicy::Variable {
        daily_threshold: Some(HourMinute::new(7, 30)),
        monthly_threshold_hours: None,
        standard: Default::default(),
    };
    let card = Timecard::work(staff_owner(), d("2025-01-15"), t("09:00"), t("18:00"), 60);
    let c = compute_daily(&card, Some(&pattern(policy, false)));
    assert_eq!(c.work_minutes, 480);
    assert_eq!(c.overtime_minutes, 30);
}

#[test]
fn test_weekend_counts_as_holiday_work() {
    // Saturday
    let card = Timecard::work(staff_owner(), d("2025-01-18"), t("10:00"), t("15:00"), 0);
    let c = compute_daily(&card, Some(&pattern(premium_8h(), true)));
    assert_eq!(c.work_minutes, 300);
    assert_eq!(c.holiday_work_minutes, 300);
}

#[test]
fn test_overnight_shift_with_late_night_break() {
    let mut card = Timecard::work(staff_owner(), d("2025-01-15"), t("22:00"), t("07:00"), 0);
    assert!(card.end_time_next_day);
    card.late_night_break_minutes = 60;

    let c = compute_daily(&card, Some(&pattern(premium_8h(), true)));
    assert_eq!(c.work_minutes, 480);
    assert_eq!(c.overtime_minutes, 0);
    // 22:00-05:00 is 420 minutes, minus the 60 minute break inside it
    assert_eq!(c.late_night_minutes, 360);
}

#[test]
fn test_midnight_premium_disabled() {
    let card = Timecard::work(staff_owner(), d("2025-01-15"), t("20:00"), t("23:30"), 0);
    let c = compute_daily(&card, Some(&pattern(premium_8h(), false)));
    assert_eq!(c.work_minutes, 210);
    assert_eq!(c.late_night_minutes, 0);
}

#[test]
fn test_monthly_regimes_have_no_daily_overtime() {
    let card = Timecard::work(staff_owner(), d("2025-01-15"), t("08:00"), t("20:00"), 60);
    for policy in [
        OvertimePolicy::MonthlyRange {
            min_hours: 140,
            max_hours: 160,
        },
        OvertimePolicy::Flextime {
            monthly_threshold_hours: None,
            standard: Default::default(),
        },
    ] {
        let c = compute_daily(&card, Some(&pattern(policy, false)));
        assert_eq!(c.work_minutes, 660);
        assert_eq!(c.overtime_minutes, 0);
    }
}

#[test]
fn test_no_pattern_counts_work_only() {
    let card = Timecard::work(staff_owner(), d("2025-01-15"), t("08:00"), t("20:00"), 60);
    let c = compute_daily(&card, None);
    assert_eq!(c.work_minutes, 660);
    assert_eq!(c.overtime_minutes, 0);
    assert_eq!(c.late_night_minutes, 0);
}

#[test]
fn test_non_working_days_are_zero() {
    for wt in [WorkType::Absence, WorkType::PaidLeave, WorkType::Holiday] {
        let mut card = Timecard::work(staff_owner(), d("2025-01-15"), t("09:00"), t("18:00"), 60);
        card.work_type = wt;
        let c = compute_daily(&card, Some(&pattern(premium_8h(), true)));
        assert_eq!(c, Default::default());
    }
}

#[test]
fn test_incomplete_card_is_zero() {
    let mut card = Timecard::new(staff_owner(), d("2025-01-15"), WorkType::Work);
    card.start_time = Some(t("09:00"));
    assert_eq!(compute_daily(&card, None), Default::default());
}

#[test]
fn test_break_longer_than_span_clamps_to_zero() {
    let card = Timecard::work(staff_owner(), d("2025-01-15"), t("09:00"), t("10:00"), 90);
    assert_eq!(compute_daily(&card, None).work_minutes, 0);
}

#[test]
fn test_shift_bounds_respects_flags() {
    let mut card = Timecard::new(staff_owner(), d("2025-01-15"), WorkType::Work);
    card.start_time = Some(t("01:00"));
    card.start_time_next_day = true;
    card.end_time = Some(t("03:00"));
    card.end_time_next_day = true;
    let (s, e) = shift_bounds(&card).unwrap();
    assert_eq!(s, ndt("2025-01-16 01:00"));
    assert_eq!(e, ndt("2025-01-16 03:00"));

    let c = compute_daily(&card, Some(&pattern(premium_8h(), true)));
    assert_eq!(c.work_minutes, 120);
    assert_eq!(c.late_night_minutes, 120);
}

#[test]
fn test_work_minutes_formula_holds() {
    for (start, end, brk, night_brk) in [
        ("09:00", "18:00", 60, 0),
        ("22:00", "06:00", 30, 30),
        ("13:00", "13:00", 0, 0),
        ("00:00", "23:59", 45, 15),
    ] {
        let mut card = Timecard::work(staff_owner(), d("2025-01-14"), t(start), t(end), brk);
        card.late_night_break_minutes = night_brk;
        let (s, e) = shift_bounds(&card).unwrap();
        let expected = ((e - s).num_minutes() - brk - night_brk).max(0);
        assert_eq!(compute_daily(&card, None).work_minutes, expected);
    }
}

#[test]
fn test_late_night_matches_minute_walk() {
    let base = ndt("2025-01-14 00:00");
    for start_step in 0..96 {
        let start = base + Duration::minutes(start_step * 17);
        for len in [0, 1, 59, 180, 420, 600, 1439, 1500, 2900] {
            let end = start + Duration::minutes(len);
            assert_eq!(
                late_night_minutes(start, end),
                late_night_walk(start, end),
                "{start} .. {end}"
            );
        }
    }
}

#[test]
fn test_late_night_boundaries() {
    assert_eq!(late_night_minutes(ndt("2025-01-14 21:00"), ndt("2025-01-14 22:00")), 0);
    assert_eq!(late_night_minutes(ndt("2025-01-14 05:00"), ndt("2025-01-14 21:59")), 0);
    assert_eq!(late_night_minutes(ndt("2025-01-14 04:00"), ndt("2025-01-14 06:00")), 60);
    assert_eq!(late_night_minutes(ndt("2025-01-14 18:00"), ndt("2025-01-14 18:00")), 0);
    assert_eq!(
        late_night_minutes_of([
            (ndt("2025-01-14 23:00"), ndt("2025-01-14 23:30")),
            (ndt("2025-01-15 02:00"), ndt("2025-01-15 03:00")),
        ]),
        90
    );
}
