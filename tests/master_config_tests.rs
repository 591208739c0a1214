use std::fs;

mod common;
use common::{master_data, open_db, premium_8h, scope, seeded, temp_file};

use rkintai::config::Config;
use rkintai::core::import::ImportEncoding;
use rkintai::core::master::MasterLogic;
use rkintai::db::log::load_log;
use rkintai::db::migrate::applied_versions;
use rkintai::db::pool::DbPool;
use rkintai::db::master::{find_overtime_pattern, find_staff_by_employee_no, find_time_punch_config};
use rkintai::errors::{AppError, ErrorKind};
use rkintai::models::{HourMinute, OvertimePolicy, RoundingMethod, StandardHours};
use rkintai::utils::table::Table;

const PATTERNS_YAML: &str = r#"
overtime_patterns:
  - id: 1
    name: range
    calculation_type: monthly_range
    min_hours: 140
    max_hours: 180
  - id: 2
    name: flex
    calculation_type: flextime
    calculate_midnight_premium: true
    standard:
      days_28: { hours: 160 }
      days_29: { hours: 165, minutes: 42 }
      days_30: { hours: 171, minutes: 25 }
      days_31: { hours: 177, minutes: 8 }
  - id: 3
    name: plain
    calculation_type: premium
    daily_threshold: { hours: 7, minutes: 30 }
    monthly_threshold_hours: 45
time_punch_configs:
  - id: 1
    name: defaults
"#;

#[test]
fn test_parse_overtime_regimes() {
    let data = MasterLogic::parse(PATTERNS_YAML).unwrap();
    assert!(data.staff.is_empty());
    assert_eq!(data.overtime_patterns.len(), 3);

    assert_eq!(
        data.overtime_patterns[0].policy,
        OvertimePolicy::MonthlyRange {
            min_hours: 140,
            max_hours: 180
        }
    );
    assert!(!data.overtime_patterns[0].calculate_midnight_premium);

    match &data.overtime_patterns[1].policy {
        OvertimePolicy::Flextime {
            monthly_threshold_hours,
            standard,
        } => {
            assert_eq!(*monthly_threshold_hours, None);
            assert_eq!(*standard, StandardHours::default());
        }
        other => panic!("unexpected policy {other:?}"),
    }

    let plain = &data.overtime_patterns[2].policy;
    assert_eq!(plain.daily_threshold_minutes(), Some(450));
    assert_eq!(plain.monthly_threshold_minutes(), Some(45 * 60));

    // omitted rounding rules fall back to one-minute rounding
    let cfg = &data.time_punch_configs[0];
    assert_eq!(cfg.start.unit, 1);
    assert_eq!(cfg.start.method, RoundingMethod::Round);
    assert!(cfg.break_input);
    assert!(!cfg.location_info);
}

#[test]
fn test_unknown_regime_is_rejected() {
    let err = MasterLogic::parse(
        "overtime_patterns:\n  - { id: 1, name: x, calculation_type: weekly }\n",
    )
    .unwrap_err();
    assert!(matches!(err, AppError::Yaml(_)));
}

#[test]
fn test_patterns_survive_storage() {
    let mut pool = open_db("master_patterns");
    let data = MasterLogic::parse(PATTERNS_YAML).unwrap();
    let summary = MasterLogic::load(&mut pool, &scope(), &data).unwrap();
    assert_eq!(summary.overtime_patterns, 3);
    assert_eq!(summary.time_punch_configs, 1);

    for expected in &data.overtime_patterns {
        let stored = find_overtime_pattern(&pool.conn, 1, expected.id).unwrap().unwrap();
        assert_eq!(&stored, expected);
    }
    let cfg = find_time_punch_config(&pool.conn, 1, 1).unwrap().unwrap();
    assert_eq!(cfg.name, "defaults");
}

#[test]
fn test_load_file_and_audit_line() {
    let mut pool = seeded("master_audit");
    let staff = find_staff_by_employee_no(&pool.conn, 1, "E001").unwrap().unwrap();
    assert_eq!(staff.name, "Sato");

    let lines = load_log(&pool.conn, 1).unwrap();
    let line = lines.iter().find(|l| l.operation == "master_load").unwrap();
    assert_eq!(line.actor, "operator:tester");
    assert!(line.message.contains("\"contracts\":2"));

    let file = temp_file("master_extra.yaml", b"staff:\n  - { id: 2, employee_no: E002, name: Suzuki }\n");
    let summary = MasterLogic::load_file(&mut pool, &scope(), &file).unwrap();
    assert_eq!(summary.staff, 1);
    assert!(find_staff_by_employee_no(&pool.conn, 1, "E002").unwrap().is_some());
}

#[test]
fn test_failed_load_leaves_nothing_behind() {
    let mut pool = open_db("master_rollback");
    let mut data = master_data(premium_8h());
    // contract pointing at a staff member that does not exist
    data.contracts[0].staff_id = Some(99);

    let err = MasterLogic::load(&mut pool, &scope(), &data).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Infrastructure);
    assert!(find_staff_by_employee_no(&pool.conn, 1, "E001").unwrap().is_none());
}

#[test]
fn test_tenants_do_not_see_each_other() {
    let pool = seeded("master_tenants");
    assert!(find_staff_by_employee_no(&pool.conn, 2, "E001").unwrap().is_none());
    assert!(find_overtime_pattern(&pool.conn, 2, 1).unwrap().is_none());
}

#[test]
fn test_migrations_run_once() {
    let path = common::setup_test_db("master_migrations");
    let first = {
        let pool = DbPool::open(&path).unwrap();
        applied_versions(&pool.conn).unwrap()
    };
    assert!(!first.is_empty());

    let pool = DbPool::open(&path).unwrap();
    assert_eq!(applied_versions(&pool.conn).unwrap(), first);

    // migration lines are visible from every tenant
    let lines = load_log(&pool.conn, 42).unwrap();
    assert_eq!(lines.len(), first.len());
    assert!(lines.iter().all(|l| l.operation == "migration_applied"));
}

#[test]
fn test_config_defaults_and_overrides() {
    let missing = std::env::temp_dir().join("rkintai_no_such.conf");
    fs::remove_file(&missing).ok();
    let cfg = Config::load_from(&missing).unwrap();
    assert_eq!(cfg.tenant_id, 1);
    assert_eq!(cfg.cancel_window_seconds, 300);
    assert_eq!(cfg.import_encoding, ImportEncoding::Cp932);
    assert_eq!(cfg.log_level, "info");

    let partial = temp_file(
        "rkintai_partial.conf",
        b"database: /tmp/custom.sqlite\ntenant_id: 7\nimport_encoding: utf-8\n",
    );
    let cfg = Config::load_from(&partial).unwrap();
    assert_eq!(cfg.database, "/tmp/custom.sqlite");
    assert_eq!(cfg.tenant_id, 7);
    assert_eq!(cfg.import_encoding, ImportEncoding::Utf8);
    assert_eq!(cfg.geocode_timeout_ms, 1500);

    let yaml = cfg.to_yaml().unwrap();
    assert!(yaml.contains("import_encoding: utf-8"));

    let broken = temp_file("rkintai_broken.conf", b"tenant_id: [oops\n");
    let err = Config::load_from(&broken).unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
}

#[test]
fn test_table_ignores_colour_codes_in_widths() {
    let mut table = Table::new(["Date", "Work"]);
    assert!(table.is_empty());
    table.add_row(vec!["2025-01-15".into(), "\x1b[32m08:00\x1b[0m".into()]);
    table.add_row(vec!["2025-01-16".into(), "--:--".into()]);

    let out = table.render();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "Date       Work");
    assert_eq!(lines[1], "----------------");
    assert_eq!(lines[2], "2025-01-15 \x1b[32m08:00\x1b[0m");
    assert_eq!(lines[3], "2025-01-16 --:--");
}

#[test]
fn test_table_counts_wide_characters_twice() {
    let mut table = Table::new(["Name", "No"]);
    table.add_row(vec!["山田".into(), "1".into()]);
    table.add_row(vec!["Sato".into(), "2".into()]);

    let out = table.render();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[2], "山田 1");
    assert_eq!(lines[3], "Sato 2");
}

#[test]
fn test_hour_minute_totals() {
    assert_eq!(HourMinute::new(177, 8).total_minutes(), 10628);
    assert_eq!(StandardHours::default().for_month_length(29), HourMinute::new(165, 42));
}
