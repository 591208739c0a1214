#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::env;
use std::fs;
use std::path::PathBuf;

use rkintai::core::master::{MasterData, MasterLogic};
use rkintai::db::pool::DbPool;
use rkintai::models::{
    Actor, Assignment, CardOwner, Contract, ContractKind, ContractStatus, HourMinute,
    OvertimePattern, OvertimePolicy, PunchMethod, RoundingMethod, RoundingRule, Scope, SlotBreak,
    Staff, TimePunchConfig, Timestamp, WorkTimePattern, WorkTimeSlot,
};

pub fn rki() -> Command {
    cargo_bin_cmd!("rkintai")
}

/// Unique test DB path inside the system temp dir, removed if it exists
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_rkintai.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Temporary file with the given content
pub fn temp_file(name: &str, content: &[u8]) -> PathBuf {
    let mut path: PathBuf = env::temp_dir();
    path.push(name);
    fs::write(&path, content).unwrap();
    path
}

pub fn open_db(name: &str) -> DbPool {
    DbPool::open(&setup_test_db(name)).unwrap()
}

pub fn scope() -> Scope {
    Scope::new(1, Actor::Operator("tester".into()))
}

pub fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn t(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}

/// `"2025-01-15 09:02:30"` in JST.
pub fn jst(s: &str) -> Timestamp {
    DateTime::parse_from_str(&format!("{s} +0900"), "%Y-%m-%d %H:%M:%S %z").unwrap()
}

pub fn ndt(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
}

/// Per-minute walk over `[start, end)`, the reference for late-night minutes.
pub fn late_night_walk(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    let mut count = 0;
    let mut cur = start;
    while cur < end {
        let h = cur.hour();
        if h >= 22 || h < 5 {
            count += 1;
        }
        cur += Duration::minutes(1);
    }
    count
}

// ---------------------------
// Master data fixture
// ---------------------------

pub const STAFF_ID: i64 = 1;
pub const STAFF_CONTRACT: i64 = 1;
pub const CLIENT_CONTRACT: i64 = 2;

pub fn staff_owner() -> CardOwner {
    CardOwner::staff(STAFF_CONTRACT, STAFF_ID)
}

pub fn client_owner() -> CardOwner {
    CardOwner::client(CLIENT_CONTRACT, STAFF_ID)
}

pub fn rule(unit: u32, method: RoundingMethod) -> RoundingRule {
    RoundingRule { unit, method }
}

pub fn punch_config() -> TimePunchConfig {
    TimePunchConfig {
        id: 1,
        name: "standard".into(),
        start: rule(1, RoundingMethod::Round),
        end: rule(10, RoundingMethod::Floor),
        break_input: true,
        break_start: rule(1, RoundingMethod::Round),
        break_end: rule(1, RoundingMethod::Round),
        punch_method: PunchMethod::Punch,
        location_info: true,
    }
}

pub fn premium_8h() -> OvertimePolicy {
    OvertimePolicy::Premium {
        daily_threshold: Some(HourMinute::new(8, 0)),
        monthly_threshold_hours: None,
    }
}

fn contract(id: i64, kind: ContractKind, number: &str, staff_id: Option<i64>) -> Contract {
    Contract {
        id,
        kind,
        contract_number: number.into(),
        staff_id,
        client_name: (kind == ContractKind::Client).then(|| "ACME".to_string()),
        status: ContractStatus::Confirmed,
        start_date: d("2025-01-01"),
        end_date: Some(d("2025-12-31")),
        time_punch_id: Some(1),
        work_time_pattern_id: Some(1),
        overtime_pattern_id: Some(1),
    }
}

/// Staff 1 (`E001`) on staff contract 1 (`SC-001`), assigned to client
/// contract 2 (`CC-001`) from Jan 10 to Jan 20, 2025. Both contracts run
/// through 2025 with the given overtime regime and midnight premium on.
pub fn master_data(policy: OvertimePolicy) -> MasterData {
    MasterData {
        staff: vec![Staff {
            id: STAFF_ID,
            employee_no: "E001".into(),
            name: "Sato".into(),
        }],
        time_punch_configs: vec![punch_config()],
        work_time_patterns: vec![WorkTimePattern {
            id: 1,
            name: "office".into(),
            slots: vec![
                WorkTimeSlot {
                    name: "day".into(),
                    start_time: t("09:00"),
                    end_time: t("18:00"),
                    breaks: vec![SlotBreak {
                        start_time: t("12:00"),
                        end_time: t("13:00"),
                    }],
                },
                WorkTimeSlot {
                    name: "night".into(),
                    start_time: t("22:00"),
                    end_time: t("07:00"),
                    breaks: vec![SlotBreak {
                        start_time: t("02:00"),
                        end_time: t("03:00"),
                    }],
                },
            ],
        }],
        overtime_patterns: vec![OvertimePattern {
            id: 1,
            name: "regime".into(),
            calculate_midnight_premium: true,
            policy,
        }],
        contracts: vec![
            contract(STAFF_CONTRACT, ContractKind::Staff, "SC-001", Some(STAFF_ID)),
            contract(CLIENT_CONTRACT, ContractKind::Client, "CC-001", None),
        ],
        assignments: vec![Assignment {
            id: 1,
            staff_contract_id: STAFF_CONTRACT,
            client_contract_id: CLIENT_CONTRACT,
            start_date: d("2025-01-10"),
            end_date: Some(d("2025-01-20")),
        }],
    }
}

pub fn seed_with(pool: &mut DbPool, policy: OvertimePolicy) {
    MasterLogic::load(pool, &scope(), &master_data(policy)).unwrap();
}

pub fn seed(pool: &mut DbPool) {
    seed_with(pool, premium_8h());
}

/// Fresh database seeded with the default fixture.
pub fn seeded(name: &str) -> DbPool {
    let mut pool = open_db(name);
    seed(&mut pool);
    pool
}
