use rust_decimal_macros::dec;

mod common;
use common::{client_owner, d, jst, scope, seeded, staff_owner, t, STAFF_ID};

use rkintai::core::approval::ApprovalLogic;
use rkintai::core::timecard::TimecardLogic;
use rkintai::core::timesheet::{SheetTransition, TimesheetLogic};
use rkintai::db::timecards::find_card;
use rkintai::errors::ErrorKind;
use rkintai::models::{ApprovalStatus, CardOwner, Timecard, WorkType, YearMonth};

fn jan() -> YearMonth {
    YearMonth::new(2025, 1).unwrap()
}

fn kind_of(card: Timecard) -> ErrorKind {
    TimecardLogic::validate(&card).unwrap_err().kind()
}

#[test]
fn test_validation_rules() {
    let mut missing_end = Timecard::new(staff_owner(), d("2025-01-15"), WorkType::Work);
    missing_end.start_time = Some(t("09:00"));
    assert_eq!(kind_of(missing_end), ErrorKind::ConstraintViolated);

    let mut backwards = Timecard::new(staff_owner(), d("2025-01-15"), WorkType::Work);
    backwards.start_time = Some(t("18:00"));
    backwards.end_time = Some(t("09:00"));
    assert_eq!(kind_of(backwards.clone()), ErrorKind::ConstraintViolated);
    backwards.end_time_next_day = true;
    assert!(TimecardLogic::validate(&backwards).is_ok());

    let leave = Timecard::new(staff_owner(), d("2025-01-15"), WorkType::PaidLeave);
    assert_eq!(kind_of(leave.clone()), ErrorKind::ConstraintViolated);

    let mut odd_leave = leave;
    odd_leave.paid_leave_days = dec!(0.7);
    assert_eq!(kind_of(odd_leave.clone()), ErrorKind::ConstraintViolated);
    odd_leave.paid_leave_days = dec!(0.5);
    assert!(TimecardLogic::validate(&odd_leave).is_ok());

    let negative = Timecard::work(staff_owner(), d("2025-01-15"), t("09:00"), t("18:00"), -5);
    assert_eq!(kind_of(negative), ErrorKind::ConstraintViolated);

    let absence = Timecard::new(staff_owner(), d("2025-01-15"), WorkType::Absence);
    assert!(TimecardLogic::validate(&absence).is_ok());
}

#[test]
fn test_save_computes_counters_and_totals() {
    let mut pool = seeded("timecard_save");
    let scope = scope();

    let card = Timecard::work(staff_owner(), d("2025-01-15"), t("09:00"), t("19:00"), 60);
    let saved = TimecardLogic::save(&mut pool, &scope, card, false).unwrap();
    assert!(saved.id > 0);
    assert_eq!(saved.counters.work_minutes, 540);
    assert_eq!(saved.counters.overtime_minutes, 60);

    let stored = find_card(&pool.conn, 1, &staff_owner(), d("2025-01-15"))
        .unwrap()
        .unwrap();
    assert_eq!(stored.counters, saved.counters);

    let sheet = TimesheetLogic::find(&pool.conn, &scope, staff_owner(), jan())
        .unwrap()
        .unwrap();
    assert_eq!(sheet.totals.work_minutes, 540);
    assert_eq!(sheet.totals.overtime_minutes, 60);
    assert_eq!(sheet.status, ApprovalStatus::Draft);
}

#[test]
fn test_upsert_replaces_same_day() {
    let mut pool = seeded("timecard_upsert");
    let scope = scope();

    let first = Timecard::work(staff_owner(), d("2025-01-15"), t("09:00"), t("18:00"), 60);
    let a = TimecardLogic::save(&mut pool, &scope, first, false).unwrap();
    let second = Timecard::work(staff_owner(), d("2025-01-15"), t("10:00"), t("15:00"), 0);
    let b = TimecardLogic::save(&mut pool, &scope, second, false).unwrap();

    assert_eq!(a.id, b.id);
    let cards = TimecardLogic::list(&pool.conn, &scope, staff_owner(), jan()).unwrap();
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].counters.work_minutes, 300);
}

#[test]
fn test_slot_prefills_times() {
    let mut pool = seeded("timecard_slot");
    let scope = scope();

    let mut card = Timecard::new(staff_owner(), d("2025-01-15"), WorkType::Work);
    card.work_time_slot = Some("night".into());
    let saved = TimecardLogic::save(&mut pool, &scope, card, false).unwrap();
    assert_eq!(saved.start_time, Some(t("22:00")));
    assert_eq!(saved.end_time, Some(t("07:00")));
    assert!(saved.end_time_next_day);
    assert_eq!(saved.break_minutes, 60);
    assert_eq!(saved.counters.work_minutes, 480);

    let mut unknown = Timecard::new(staff_owner(), d("2025-01-16"), WorkType::Work);
    unknown.work_time_slot = Some("swing".into());
    let err = TimecardLogic::save(&mut pool, &scope, unknown, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_out_of_contract_and_wrong_owner() {
    let mut pool = seeded("timecard_out_of_period");
    let scope = scope();

    let late = Timecard::work(staff_owner(), d("2026-02-02"), t("09:00"), t("18:00"), 60);
    let err = TimecardLogic::save(&mut pool, &scope, late, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfPeriod);

    let stranger = Timecard::work(
        CardOwner::staff(1, 99),
        d("2025-01-15"),
        t("09:00"),
        t("18:00"),
        60,
    );
    let err = TimecardLogic::save(&mut pool, &scope, stranger, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConstraintViolated);

    let err = TimecardLogic::save(
        &mut pool,
        &scope,
        Timecard::work(CardOwner::staff(404, 1), d("2025-01-15"), t("09:00"), t("18:00"), 0),
        false,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_client_card_written_directly() {
    let mut pool = seeded("timecard_client");
    let scope = scope();

    let card = Timecard::work(client_owner(), d("2025-03-03"), t("09:00"), t("18:00"), 60);
    let saved = TimecardLogic::save(&mut pool, &scope, card, false).unwrap();
    assert_eq!(saved.counters.work_minutes, 480);

    let march = YearMonth::new(2025, 3).unwrap();
    let sheet = TimesheetLogic::find(&pool.conn, &scope, client_owner(), march)
        .unwrap()
        .unwrap();
    assert_eq!(sheet.totals.work_days, 1);
}

#[test]
fn test_period_lock_blocks_writes_and_deletes() {
    let mut pool = seeded("timecard_lock");
    let scope = scope();

    let card = Timecard::work(staff_owner(), d("2025-01-14"), t("09:00"), t("18:00"), 60);
    TimecardLogic::save(&mut pool, &scope, card, false).unwrap();

    ApprovalLogic::submit(&mut pool, &scope, STAFF_ID, jan(), jst("2025-02-01 10:00:00")).unwrap();

    let card = Timecard::work(staff_owner(), d("2025-01-15"), t("09:00"), t("18:00"), 60);
    let err = TimecardLogic::save(&mut pool, &scope, card, false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LockedPeriod);
    assert!(find_card(&pool.conn, 1, &staff_owner(), d("2025-01-15")).unwrap().is_none());

    let err = TimecardLogic::delete(&mut pool, &scope, staff_owner(), d("2025-01-14")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LockedPeriod);
    assert!(find_card(&pool.conn, 1, &staff_owner(), d("2025-01-14")).unwrap().is_some());

    // February is not locked
    let feb = Timecard::work(staff_owner(), d("2025-02-03"), t("09:00"), t("18:00"), 60);
    TimecardLogic::save(&mut pool, &scope, feb, false).unwrap();

    ApprovalLogic::withdraw(&mut pool, &scope, STAFF_ID, jan()).unwrap();
    let card = Timecard::work(staff_owner(), d("2025-01-15"), t("09:00"), t("18:00"), 60);
    TimecardLogic::save(&mut pool, &scope, card, false).unwrap();
}

#[test]
fn test_delete_recomputes_month() {
    let mut pool = seeded("timecard_delete");
    let scope = scope();

    for day in ["2025-01-14", "2025-01-15"] {
        let card = Timecard::work(staff_owner(), d(day), t("09:00"), t("18:00"), 60);
        TimecardLogic::save(&mut pool, &scope, card, false).unwrap();
    }
    TimecardLogic::delete(&mut pool, &scope, staff_owner(), d("2025-01-14")).unwrap();

    let sheet = TimesheetLogic::find(&pool.conn, &scope, staff_owner(), jan())
        .unwrap()
        .unwrap();
    assert_eq!(sheet.totals.work_days, 1);
    assert_eq!(sheet.totals.work_minutes, 480);

    let err = TimecardLogic::delete(&mut pool, &scope, staff_owner(), d("2025-01-14")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_timesheet_lifecycle_controls_edits() {
    let mut pool = seeded("timecard_sheet_lifecycle");
    let scope = scope();
    let now = jst("2025-02-01 09:00:00");

    let card = Timecard::work(staff_owner(), d("2025-01-14"), t("09:00"), t("18:00"), 60);
    TimecardLogic::save(&mut pool, &scope, card, true).unwrap();

    let err = TimesheetLogic::transition(
        &mut pool,
        &scope,
        staff_owner(),
        jan(),
        SheetTransition::Approve,
        now,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let sheet = TimesheetLogic::transition(
        &mut pool,
        &scope,
        staff_owner(),
        jan(),
        SheetTransition::Submit,
        now,
    )
    .unwrap();
    assert_eq!(sheet.status, ApprovalStatus::Submitted);
    assert_eq!(sheet.totals.work_minutes, 480);
    assert_eq!(sheet.submitted_by.as_deref(), Some("operator:tester"));

    let card = Timecard::work(staff_owner(), d("2025-01-15"), t("09:00"), t("18:00"), 60);
    let err = TimecardLogic::save(&mut pool, &scope, card.clone(), false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LockedPeriod);

    let sheet = TimesheetLogic::transition(
        &mut pool,
        &scope,
        staff_owner(),
        jan(),
        SheetTransition::Reject {
            reason: "missing day".into(),
        },
        now,
    )
    .unwrap();
    assert_eq!(sheet.status, ApprovalStatus::Rejected);
    assert_eq!(sheet.rejection_reason.as_deref(), Some("missing day"));

    TimecardLogic::save(&mut pool, &scope, card, false).unwrap();

    let sheet = TimesheetLogic::transition(
        &mut pool,
        &scope,
        staff_owner(),
        jan(),
        SheetTransition::Submit,
        now,
    )
    .unwrap();
    assert_eq!(sheet.totals.work_minutes, 960);

    let sheet = TimesheetLogic::transition(
        &mut pool,
        &scope,
        staff_owner(),
        jan(),
        SheetTransition::Approve,
        now,
    )
    .unwrap();
    assert_eq!(sheet.status, ApprovalStatus::Approved);
    assert!(sheet.approved_at.is_some());
}

#[test]
fn test_delete_timesheet_removes_its_month() {
    let mut pool = seeded("timecard_sheet_delete");
    let scope = scope();
    let now = jst("2025-02-01 09:00:00");

    for day in ["2025-01-14", "2025-01-15"] {
        let card = Timecard::work(staff_owner(), d(day), t("09:00"), t("18:00"), 60);
        TimecardLogic::save(&mut pool, &scope, card, false).unwrap();
    }
    let feb = Timecard::work(staff_owner(), d("2025-02-03"), t("09:00"), t("18:00"), 60);
    TimecardLogic::save(&mut pool, &scope, feb, false).unwrap();

    // a submitted sheet stays
    TimesheetLogic::transition(&mut pool, &scope, staff_owner(), jan(), SheetTransition::Submit, now)
        .unwrap();
    let err = TimesheetLogic::delete(&mut pool, &scope, staff_owner(), jan()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LockedPeriod);
    TimesheetLogic::transition(&mut pool, &scope, staff_owner(), jan(), SheetTransition::Withdraw, now)
        .unwrap();

    // so does a month under approval
    ApprovalLogic::submit(&mut pool, &scope, STAFF_ID, jan(), now).unwrap();
    let err = TimesheetLogic::delete(&mut pool, &scope, staff_owner(), jan()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LockedPeriod);
    ApprovalLogic::withdraw(&mut pool, &scope, STAFF_ID, jan()).unwrap();

    let removed = TimesheetLogic::delete(&mut pool, &scope, staff_owner(), jan()).unwrap();
    assert_eq!(removed, 2);
    assert!(TimesheetLogic::find(&pool.conn, &scope, staff_owner(), jan()).unwrap().is_none());
    assert!(TimecardLogic::list(&pool.conn, &scope, staff_owner(), jan()).unwrap().is_empty());
    assert!(find_card(&pool.conn, 1, &staff_owner(), d("2025-02-03")).unwrap().is_some());

    let log = rkintai::db::log::load_log(&pool.conn, 1).unwrap();
    assert!(log.iter().any(|l| l.operation == "timesheet_delete" && l.message == "timecards=2"));

    let err = TimesheetLogic::delete(&mut pool, &scope, staff_owner(), jan()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
