use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

mod common;
use common::{rki, setup_test_db, temp_file};

const MASTER_YAML: &str = r#"
staff:
  - { id: 1, employee_no: "E001", name: "Sato" }
time_punch_configs:
  - id: 1
    name: standard
    start: { unit: 1, method: round }
    end: { unit: 10, method: floor }
    punch_method: punch
    location_info: true
work_time_patterns:
  - id: 1
    name: office
    slots:
      - name: day
        start_time: "09:00"
        end_time: "18:00"
        breaks:
          - { start_time: "12:00", end_time: "13:00" }
overtime_patterns:
  - id: 1
    name: standard
    calculation_type: premium
    calculate_midnight_premium: true
    daily_threshold: { hours: 8 }
contracts:
  - id: 1
    kind: staff
    contract_number: SC-001
    staff_id: 1
    status: confirmed
    start_date: 2025-01-01
    end_date: 2025-12-31
    time_punch_id: 1
    work_time_pattern_id: 1
    overtime_pattern_id: 1
  - id: 2
    kind: client
    contract_number: CC-001
    client_name: ACME
    status: confirmed
    start_date: 2025-01-01
    time_punch_id: 1
    work_time_pattern_id: 1
    overtime_pattern_id: 1
assignments:
  - { id: 1, staff_contract_id: 1, client_contract_id: 2, start_date: 2025-01-10, end_date: 2025-01-20 }
"#;

/// Initialised database with the master data above loaded.
fn prepared(name: &str) -> String {
    let db_path = setup_test_db(name);
    rki()
        .args(["--db", &db_path, "--test", "init"])
        .assert()
        .success();

    let yaml = temp_file(&format!("{name}_master.yaml"), MASTER_YAML.as_bytes());
    rki()
        .args(["--db", &db_path, "master", "load", &yaml.to_string_lossy()])
        .assert()
        .success()
        .stdout(contains("Loaded 1 staff, 2 contracts, 1 assignments"));
    db_path
}

#[test]
fn test_init_creates_database() {
    let db_path = setup_test_db("cli_init");
    rki()
        .args(["--db", &db_path, "--test", "init"])
        .assert()
        .success()
        .stdout(contains("initialization completed"));
    assert!(std::path::Path::new(&db_path).exists());
}

#[test]
fn test_timecard_set_and_list() {
    let db_path = prepared("cli_timecard");

    rki()
        .args([
            "--db", &db_path, "timecard", "set", "--contract", "1", "--date", "2025-01-15",
            "--in", "09:00", "--out", "19:00", "--break", "60",
        ])
        .assert()
        .success()
        .stdout(contains("Timecard saved"));

    rki()
        .args([
            "--db", &db_path, "timecard", "set", "--contract", "1", "--date", "2025-01-16",
            "--slot", "day",
        ])
        .assert()
        .success();

    rki()
        .args(["--db", &db_path, "timecard", "list", "--contract", "1", "--month", "2025-01"])
        .assert()
        .success()
        .stdout(contains("2025-01-15").and(contains("2025-01-16")))
        .stdout(contains("days 2"));

    rki()
        .args([
            "--db", &db_path, "timecard", "list", "--contract", "1", "--month", "2025-01",
            "--json",
        ])
        .assert()
        .success()
        .stdout(contains("\"overtime_minutes\": 60"));
}

#[test]
fn test_timecard_errors_carry_their_kind() {
    let db_path = prepared("cli_timecard_errors");

    rki()
        .args([
            "--db", &db_path, "timecard", "set", "--contract", "1", "--date", "2026-06-01",
            "--in", "09:00", "--out", "18:00",
        ])
        .assert()
        .failure()
        .stderr(contains("[out_of_period]"));

    rki()
        .args([
            "--db", &db_path, "timecard", "set", "--contract", "1", "--date", "2025-01-15",
            "--in", "18:00", "--out", "09:00",
        ])
        .assert()
        .failure()
        .stderr(contains("[constraint_violated]"));

    rki()
        .args([
            "--db", &db_path, "timecard", "list", "--contract", "2", "--month", "2025-01",
        ])
        .assert()
        .failure()
        .stderr(contains("--staff is required"));

    rki()
        .args(["--db", &db_path, "timecard", "del", "--contract", "1", "--date", "2025-01-15"])
        .assert()
        .failure()
        .stderr(contains("[not_found]"));
}

#[test]
fn test_punch_flow() {
    let db_path = prepared("cli_punch");

    rki()
        .args([
            "--db", &db_path, "punch", "start", "--staff", "1", "--at",
            "2025-01-15T09:00:00+09:00", "--lat", "35.68", "--lon", "139.76",
        ])
        .assert()
        .success()
        .stdout(contains("start recorded"));

    rki()
        .args([
            "--db", &db_path, "punch", "end", "--staff", "1", "--at",
            "2025-01-15T18:07:00+09:00",
        ])
        .assert()
        .success()
        .stdout(contains("rounded 18:00"));

    rki()
        .args([
            "--db", &db_path, "status", "--staff", "1", "--at", "2025-01-15T20:00:00+09:00",
        ])
        .assert()
        .success()
        .stdout(contains("finished").and(contains("SC-001")));

    rki()
        .args([
            "--db", &db_path, "punch", "break-start", "--staff", "1", "--at",
            "2025-01-15T20:00:00+09:00",
        ])
        .assert()
        .failure()
        .stderr(contains("[invalid_state]"));
}

#[test]
fn test_submit_approve_and_lock() {
    let db_path = prepared("cli_approval");

    rki()
        .args([
            "--db", &db_path, "punch", "start", "--staff", "1", "--at",
            "2025-01-15T09:00:00+09:00",
        ])
        .assert()
        .success();
    rki()
        .args([
            "--db", &db_path, "punch", "end", "--staff", "1", "--at",
            "2025-01-15T18:00:00+09:00",
        ])
        .assert()
        .success();

    rki()
        .args(["--db", &db_path, "submit", "--staff", "1", "--month", "2025-01"])
        .assert()
        .success()
        .stdout(contains("approval #1"));

    rki()
        .args([
            "--db", &db_path, "timecard", "set", "--contract", "1", "--date", "2025-01-16",
            "--slot", "day",
        ])
        .assert()
        .failure()
        .stderr(contains("[locked_period]"));

    rki()
        .args(["--db", &db_path, "approve", "--id", "1"])
        .assert()
        .success()
        .stdout(contains("Synced 1 staff timecards, 1 client timecards"));

    rki()
        .args([
            "--db", &db_path, "timecard", "list", "--contract", "2", "--staff", "1", "--month",
            "2025-01",
        ])
        .assert()
        .success()
        .stdout(contains("2025-01-15"));

    rki()
        .args(["--db", &db_path, "reject", "--id", "1", "--reason", "late"])
        .assert()
        .failure()
        .stderr(contains("[invalid_state]"));
}

#[test]
fn test_import_upload_and_run() {
    let db_path = prepared("cli_import");
    let csv = temp_file(
        "cli_import.csv",
        b"employee_no,contract_no,work_date,work_type,pattern_name,start_time,start_next_day,end_time,end_next_day,break_minutes,paid_leave_days,memo\n\
E001,SC-001,2025-01-15,10,,09:00,0,18:00,0,60,0,\n\
E002,SC-001,2025-01-16,10,,09:00,0,18:00,0,60,0,\n",
    );

    let output = rki()
        .args(["--db", &db_path, "import", "upload", &csv.to_string_lossy()])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let id = stdout.lines().last().unwrap().trim().to_string();

    rki()
        .args(["--db", &db_path, "import", "run", &id, "--encoding", "utf-8"])
        .assert()
        .success()
        .stdout(contains("[completed] 2/2 rows, 1 imported, 1 errors"))
        .stdout(contains("line 3"));

    rki()
        .args(["--db", &db_path, "import", "cancel", &id])
        .assert()
        .failure()
        .stderr(contains("[invalid_state]"));
}

#[test]
fn test_log_print_lists_operations() {
    let db_path = prepared("cli_log");

    rki()
        .args(["--db", &db_path, "--operator", "yamada", "log", "--print"])
        .assert()
        .success()
        .stdout(contains("master_load").and(contains("init")));
}

#[test]
fn test_unknown_command_fails() {
    rki().args(["frobnicate"]).assert().failure();
}
