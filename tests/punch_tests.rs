use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

mod common;
use common::{jst, master_data, open_db, premium_8h, scope, seeded, STAFF_ID};

use rkintai::core::approval::ApprovalLogic;
use rkintai::core::geocode::{CachedGeocoder, Geocoder, NoopGeocoder, TimeoutGeocoder};
use rkintai::core::master::MasterLogic;
use rkintai::core::punch::{LastEvent, PunchEvent, PunchLogic, PunchOptions, PunchState};
use rkintai::db::pool::DbPool;
use rkintai::errors::ErrorKind;
use rkintai::models::{ContractStatus, Location, PunchMethod, YearMonth};

fn punch(pool: &mut DbPool, event: PunchEvent, at: &str) -> rkintai::errors::AppResult<PunchState> {
    PunchLogic::apply(
        pool,
        &scope(),
        STAFF_ID,
        event,
        jst(at),
        None,
        &PunchOptions::default(),
    )
    .map(|o| o.state)
}

struct FixedGeocoder {
    calls: AtomicUsize,
}

impl FixedGeocoder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl Geocoder for FixedGeocoder {
    fn fetch_address(&self, _lat: f64, _lon: f64) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Some("Chiyoda, Tokyo".into())
    }
}

struct SlowGeocoder;

impl Geocoder for SlowGeocoder {
    fn fetch_address(&self, _lat: f64, _lon: f64) -> Option<String> {
        thread::sleep(Duration::from_millis(500));
        Some("too late".into())
    }
}

#[test]
fn test_full_day_of_punches() {
    let mut pool = seeded("punch_full_day");

    assert_eq!(
        punch(&mut pool, PunchEvent::Start, "2025-01-15 09:00:00").unwrap(),
        PunchState::Working
    );
    assert_eq!(
        punch(&mut pool, PunchEvent::BreakStart, "2025-01-15 12:00:00").unwrap(),
        PunchState::OnBreak
    );
    assert_eq!(
        punch(&mut pool, PunchEvent::BreakEnd, "2025-01-15 13:00:00").unwrap(),
        PunchState::Working
    );
    assert_eq!(
        punch(&mut pool, PunchEvent::End, "2025-01-15 18:07:00").unwrap(),
        PunchState::Finished
    );

    let status = PunchLogic::state(&pool.conn, &scope(), STAFF_ID, jst("2025-01-15 20:00:00")).unwrap();
    assert_eq!(status.state, PunchState::Finished);
    let rec = status.record.unwrap();
    assert_eq!(rec.rounded_start_time, jst("2025-01-15 09:00:00"));
    assert_eq!(rec.end_time, Some(jst("2025-01-15 18:07:00")));
    assert_eq!(rec.rounded_end_time, Some(jst("2025-01-15 18:00:00")));
    assert_eq!(rec.breaks.len(), 1);
    assert_eq!(rec.total_break_minutes(), 60);
    assert_eq!(rec.total_work_minutes(), 480);
    assert_eq!(status.contract.unwrap().contract_number, "SC-001");
}

#[test]
fn test_invalid_transitions() {
    let mut pool = seeded("punch_invalid");

    let err = punch(&mut pool, PunchEvent::End, "2025-01-15 08:00:00").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    let err = punch(&mut pool, PunchEvent::Cancel, "2025-01-15 08:00:00").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    punch(&mut pool, PunchEvent::Start, "2025-01-15 09:00:00").unwrap();
    let err = punch(&mut pool, PunchEvent::Start, "2025-01-15 09:01:00").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    let err = punch(&mut pool, PunchEvent::BreakEnd, "2025-01-15 09:10:00").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    punch(&mut pool, PunchEvent::BreakStart, "2025-01-15 12:00:00").unwrap();
    let err = punch(&mut pool, PunchEvent::End, "2025-01-15 12:30:00").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    // a punch may not go back in time
    let err = punch(&mut pool, PunchEvent::BreakEnd, "2025-01-15 11:59:00").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConstraintViolated);

    punch(&mut pool, PunchEvent::BreakEnd, "2025-01-15 12:45:00").unwrap();
    punch(&mut pool, PunchEvent::End, "2025-01-15 17:00:00").unwrap();
    let err = punch(&mut pool, PunchEvent::BreakStart, "2025-01-15 17:30:00").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn test_no_contract_is_out_of_period() {
    let mut pool = seeded("punch_out_of_period");
    let err = punch(&mut pool, PunchEvent::Start, "2026-03-02 09:00:00").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OutOfPeriod);

    let status = PunchLogic::state(&pool.conn, &scope(), STAFF_ID, jst("2026-03-02 09:00:00")).unwrap();
    assert_eq!(status.state, PunchState::NotStarted);
    assert!(status.contract.is_none());
}

#[test]
fn test_start_requires_confirmed_contract_and_live_punching() {
    let mut pool = open_db("punch_unconfirmed");
    let mut data = master_data(premium_8h());
    data.contracts[0].status = ContractStatus::Issued;
    MasterLogic::load(&mut pool, &scope(), &data).unwrap();
    let err = punch(&mut pool, PunchEvent::Start, "2025-01-15 09:00:00").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let mut pool = open_db("punch_manual_method");
    let mut data = master_data(premium_8h());
    data.time_punch_configs[0].punch_method = PunchMethod::Manual;
    MasterLogic::load(&mut pool, &scope(), &data).unwrap();
    let err = punch(&mut pool, PunchEvent::Start, "2025-01-15 09:00:00").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn test_cancel_undoes_latest_punch() {
    let mut pool = seeded("punch_cancel");
    let opts = PunchOptions::default();

    punch(&mut pool, PunchEvent::Start, "2025-01-15 09:00:00").unwrap();
    punch(&mut pool, PunchEvent::BreakStart, "2025-01-15 12:00:00").unwrap();

    let outcome = PunchLogic::apply(
        &mut pool,
        &scope(),
        STAFF_ID,
        PunchEvent::Cancel,
        jst("2025-01-15 12:02:00"),
        None,
        &opts,
    )
    .unwrap();
    assert!(matches!(outcome.undone, Some(LastEvent::BreakStart { .. })));
    assert_eq!(outcome.state, PunchState::Working);
    assert!(outcome.record.unwrap().breaks.is_empty());

    punch(&mut pool, PunchEvent::End, "2025-01-15 18:00:00").unwrap();
    assert_eq!(
        punch(&mut pool, PunchEvent::Cancel, "2025-01-15 18:04:59").unwrap(),
        PunchState::Working
    );

    punch(&mut pool, PunchEvent::End, "2025-01-15 18:10:00").unwrap();
    // exactly five minutes later the window is closed
    let err = punch(&mut pool, PunchEvent::Cancel, "2025-01-15 18:15:00").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn test_cancel_of_start_removes_record() {
    let mut pool = seeded("punch_cancel_start");

    punch(&mut pool, PunchEvent::Start, "2025-01-15 09:00:00").unwrap();
    assert_eq!(
        punch(&mut pool, PunchEvent::Cancel, "2025-01-15 09:01:00").unwrap(),
        PunchState::NotStarted
    );
    let status = PunchLogic::state(&pool.conn, &scope(), STAFF_ID, jst("2025-01-15 09:02:00")).unwrap();
    assert!(status.record.is_none());

    // a fresh start is allowed again
    assert_eq!(
        punch(&mut pool, PunchEvent::Start, "2025-01-15 09:03:00").unwrap(),
        PunchState::Working
    );
}

#[test]
fn test_custom_cancel_window() {
    let mut pool = seeded("punch_cancel_window");
    let opts = PunchOptions {
        cancel_window_seconds: 60,
        geocoder: &NoopGeocoder,
    };

    punch(&mut pool, PunchEvent::Start, "2025-01-15 09:00:00").unwrap();
    let err = PunchLogic::apply(
        &mut pool,
        &scope(),
        STAFF_ID,
        PunchEvent::Cancel,
        jst("2025-01-15 09:02:00"),
        None,
        &opts,
    )
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn test_overnight_shift_ends_on_previous_record() {
    let mut pool = seeded("punch_overnight");

    punch(&mut pool, PunchEvent::Start, "2025-01-15 22:00:00").unwrap();
    punch(&mut pool, PunchEvent::BreakStart, "2025-01-16 02:00:00").unwrap();
    punch(&mut pool, PunchEvent::BreakEnd, "2025-01-16 03:00:00").unwrap();
    punch(&mut pool, PunchEvent::End, "2025-01-16 05:03:00").unwrap();

    let status = PunchLogic::state(&pool.conn, &scope(), STAFF_ID, jst("2025-01-16 05:10:00")).unwrap();
    // the finished overnight record no longer surfaces on the 16th
    assert_eq!(status.state, PunchState::NotStarted);

    let status = PunchLogic::state(&pool.conn, &scope(), STAFF_ID, jst("2025-01-15 23:00:00")).unwrap();
    let rec = status.record.unwrap();
    assert_eq!(rec.work_date, common::d("2025-01-15"));
    assert_eq!(rec.rounded_end_time, Some(jst("2025-01-16 05:00:00")));
    assert_eq!(rec.total_work_minutes(), 360);
}

#[test]
fn test_cancel_after_midnight_reopens_overnight_record() {
    let mut pool = seeded("punch_cancel_overnight_end");

    punch(&mut pool, PunchEvent::Start, "2025-01-15 22:00:00").unwrap();
    punch(&mut pool, PunchEvent::End, "2025-01-16 05:03:00").unwrap();

    let state = punch(&mut pool, PunchEvent::Cancel, "2025-01-16 05:04:00").unwrap();
    assert_eq!(state, PunchState::Working);

    let status = PunchLogic::state(&pool.conn, &scope(), STAFF_ID, jst("2025-01-16 05:05:00")).unwrap();
    let rec = status.record.unwrap();
    assert_eq!(rec.work_date, common::d("2025-01-15"));
    assert!(rec.is_open());

    punch(&mut pool, PunchEvent::End, "2025-01-16 06:00:00").unwrap();
    let err = punch(&mut pool, PunchEvent::Cancel, "2025-01-16 06:06:00").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[test]
fn test_cancel_day_shift_end_across_midnight() {
    let mut pool = seeded("punch_cancel_midnight_end");

    punch(&mut pool, PunchEvent::Start, "2025-01-15 15:00:00").unwrap();
    punch(&mut pool, PunchEvent::End, "2025-01-15 23:59:00").unwrap();

    let state = punch(&mut pool, PunchEvent::Cancel, "2025-01-16 00:01:00").unwrap();
    assert_eq!(state, PunchState::Working);

    let status = PunchLogic::state(&pool.conn, &scope(), STAFF_ID, jst("2025-01-16 00:02:00")).unwrap();
    let rec = status.record.unwrap();
    assert_eq!(rec.work_date, common::d("2025-01-15"));
    assert_eq!(rec.end_time, None);
}

#[test]
fn test_locked_period_rejects_start() {
    let mut pool = seeded("punch_locked");
    let jan = YearMonth::new(2025, 1).unwrap();
    ApprovalLogic::submit(&mut pool, &scope(), STAFF_ID, jan, jst("2025-01-14 18:00:00")).unwrap();

    let err = punch(&mut pool, PunchEvent::Start, "2025-01-16 09:00:00").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::LockedPeriod);

    ApprovalLogic::withdraw(&mut pool, &scope(), STAFF_ID, jan).unwrap();
    punch(&mut pool, PunchEvent::Start, "2025-01-16 09:00:00").unwrap();
}

#[test]
fn test_location_is_geocoded_after_commit() {
    let mut pool = seeded("punch_location");
    let geocoder = FixedGeocoder::new();
    let opts = PunchOptions {
        cancel_window_seconds: 300,
        geocoder: &geocoder,
    };
    let here = Location {
        lat: 35.6812,
        lon: 139.7671,
        address: Some("ignored".into()),
    };

    let outcome = PunchLogic::apply(
        &mut pool,
        &scope(),
        STAFF_ID,
        PunchEvent::Start,
        jst("2025-01-15 09:00:00"),
        Some(here.clone()),
        &opts,
    )
    .unwrap();
    let start = outcome.record.unwrap().start_location.unwrap();
    assert_eq!(start.lat, 35.6812);
    assert_eq!(start.address.as_deref(), Some("Chiyoda, Tokyo"));

    let outcome = PunchLogic::apply(
        &mut pool,
        &scope(),
        STAFF_ID,
        PunchEvent::End,
        jst("2025-01-15 18:00:00"),
        None,
        &opts,
    )
    .unwrap();
    assert!(outcome.record.unwrap().end_location.is_none());
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_location_dropped_when_not_collected() {
    let mut pool = open_db("punch_no_location");
    let mut data = master_data(premium_8h());
    data.time_punch_configs[0].location_info = false;
    MasterLogic::load(&mut pool, &scope(), &data).unwrap();

    let geocoder = FixedGeocoder::new();
    let opts = PunchOptions {
        cancel_window_seconds: 300,
        geocoder: &geocoder,
    };
    let outcome = PunchLogic::apply(
        &mut pool,
        &scope(),
        STAFF_ID,
        PunchEvent::Start,
        jst("2025-01-15 09:00:00"),
        Some(Location {
            lat: 35.0,
            lon: 135.0,
            address: None,
        }),
        &opts,
    )
    .unwrap();
    assert!(outcome.record.unwrap().start_location.is_none());
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_cached_geocoder_hits_provider_once() {
    let provider = Arc::new(FixedGeocoder::new());
    let cached = CachedGeocoder::new(Arc::clone(&provider));

    assert_eq!(
        cached.fetch_address(35.681236, 139.767121).as_deref(),
        Some("Chiyoda, Tokyo")
    );
    // same coordinate at five decimals
    assert!(cached.fetch_address(35.681239, 139.767118).is_some());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    assert!(cached.fetch_address(34.0, 135.0).is_some());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

    let empty = CachedGeocoder::new(NoopGeocoder);
    assert!(empty.fetch_address(1.0, 1.0).is_none());
}

#[test]
fn test_timeout_geocoder_gives_up() {
    let slow = TimeoutGeocoder::new(SlowGeocoder, Duration::from_millis(50));
    assert!(slow.fetch_address(35.0, 139.0).is_none());

    let fast = TimeoutGeocoder::new(FixedGeocoder::new(), Duration::from_millis(1000));
    assert_eq!(fast.fetch_address(35.0, 139.0).as_deref(), Some("Chiyoda, Tokyo"));
}
