//! Schema migrations.
//!
//! Every migration is recorded in the `log` table as `migration_applied`
//! with its version as target, so re-running is a no-op.

use rusqlite::{Connection, OptionalExtension, params};
use tracing::info;

use crate::errors::{AppError, AppResult};

struct Migration {
    version: &'static str,
    description: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "20250301_0001_master_data",
        description: "staff, contracts, assignments and policy patterns",
        sql: r#"
        CREATE TABLE IF NOT EXISTS staff (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id    INTEGER NOT NULL,
            employee_no  TEXT NOT NULL,
            name         TEXT NOT NULL,
            UNIQUE (tenant_id, employee_no)
        );

        CREATE TABLE IF NOT EXISTS time_punch_configs (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id           INTEGER NOT NULL,
            name                TEXT NOT NULL,
            start_unit          INTEGER NOT NULL DEFAULT 1,
            start_method        TEXT NOT NULL DEFAULT 'round',
            end_unit            INTEGER NOT NULL DEFAULT 1,
            end_method          TEXT NOT NULL DEFAULT 'round',
            break_input         INTEGER NOT NULL DEFAULT 1,
            break_start_unit    INTEGER NOT NULL DEFAULT 1,
            break_start_method  TEXT NOT NULL DEFAULT 'round',
            break_end_unit      INTEGER NOT NULL DEFAULT 1,
            break_end_method    TEXT NOT NULL DEFAULT 'round',
            punch_method        TEXT NOT NULL DEFAULT 'punch' CHECK (punch_method IN ('punch','manual')),
            location_info       INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS work_time_patterns (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id  INTEGER NOT NULL,
            name       TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS work_time_slots (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id   INTEGER NOT NULL,
            pattern_id  INTEGER NOT NULL REFERENCES work_time_patterns(id) ON DELETE CASCADE,
            position    INTEGER NOT NULL,
            name        TEXT NOT NULL,
            start_time  TEXT NOT NULL,
            end_time    TEXT NOT NULL,
            breaks      TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS overtime_patterns (
            id                          INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id                   INTEGER NOT NULL,
            name                        TEXT NOT NULL,
            calculation_type            TEXT NOT NULL,
            calculate_midnight_premium  INTEGER NOT NULL DEFAULT 0,
            daily_overtime_enabled      INTEGER NOT NULL DEFAULT 0,
            daily_overtime_hours        INTEGER,
            daily_overtime_minutes      INTEGER,
            monthly_overtime_enabled    INTEGER NOT NULL DEFAULT 0,
            monthly_overtime_hours      INTEGER,
            monthly_range_min           INTEGER,
            monthly_range_max           INTEGER,
            days_28_hours               INTEGER NOT NULL DEFAULT 160,
            days_28_minutes             INTEGER NOT NULL DEFAULT 0,
            days_29_hours               INTEGER NOT NULL DEFAULT 165,
            days_29_minutes             INTEGER NOT NULL DEFAULT 42,
            days_30_hours               INTEGER NOT NULL DEFAULT 171,
            days_30_minutes             INTEGER NOT NULL DEFAULT 25,
            days_31_hours               INTEGER NOT NULL DEFAULT 177,
            days_31_minutes             INTEGER NOT NULL DEFAULT 8
        );

        CREATE TABLE IF NOT EXISTS contracts (
            id                    INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id             INTEGER NOT NULL,
            kind                  TEXT NOT NULL CHECK (kind IN ('staff','client')),
            contract_number       TEXT NOT NULL,
            staff_id              INTEGER REFERENCES staff(id),
            client_name           TEXT,
            status                INTEGER NOT NULL DEFAULT 1,
            start_date            TEXT NOT NULL,
            end_date              TEXT,
            time_punch_id         INTEGER REFERENCES time_punch_configs(id),
            work_time_pattern_id  INTEGER REFERENCES work_time_patterns(id),
            overtime_pattern_id   INTEGER REFERENCES overtime_patterns(id),
            UNIQUE (tenant_id, contract_number)
        );

        CREATE INDEX IF NOT EXISTS idx_contracts_staff ON contracts(tenant_id, staff_id);

        CREATE TABLE IF NOT EXISTS assignments (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id           INTEGER NOT NULL,
            staff_contract_id   INTEGER NOT NULL REFERENCES contracts(id),
            client_contract_id  INTEGER NOT NULL REFERENCES contracts(id),
            start_date          TEXT NOT NULL,
            end_date            TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_assignments_staff_contract
            ON assignments(tenant_id, staff_contract_id);
        "#,
    },
    Migration {
        version: "20250301_0002_attendance",
        description: "timerecords, timecards, timesheets and approvals",
        sql: r#"
        CREATE TABLE IF NOT EXISTS timerecords (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id           INTEGER NOT NULL,
            staff_id            INTEGER NOT NULL,
            staff_contract_id   INTEGER NOT NULL REFERENCES contracts(id),
            work_date           TEXT NOT NULL,
            start_time          TEXT NOT NULL,
            end_time            TEXT,
            rounded_start_time  TEXT NOT NULL,
            rounded_end_time    TEXT,
            start_lat           REAL,
            start_lon           REAL,
            start_address       TEXT,
            end_lat             REAL,
            end_lon             REAL,
            end_address         TEXT,
            memo                TEXT,
            UNIQUE (tenant_id, staff_contract_id, work_date)
        );

        CREATE INDEX IF NOT EXISTS idx_timerecords_staff_date
            ON timerecords(tenant_id, staff_id, work_date);

        CREATE TABLE IF NOT EXISTS timerecord_breaks (
            id                   INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id            INTEGER NOT NULL,
            timerecord_id        INTEGER NOT NULL REFERENCES timerecords(id) ON DELETE CASCADE,
            break_start          TEXT NOT NULL,
            break_end            TEXT,
            rounded_break_start  TEXT NOT NULL,
            rounded_break_end    TEXT,
            start_lat            REAL,
            start_lon            REAL,
            start_address        TEXT,
            end_lat              REAL,
            end_lon              REAL,
            end_address          TEXT
        );

        CREATE TABLE IF NOT EXISTS timecards (
            id                        INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id                 INTEGER NOT NULL,
            side                      TEXT NOT NULL CHECK (side IN ('staff','client')),
            contract_id               INTEGER NOT NULL REFERENCES contracts(id),
            staff_id                  INTEGER NOT NULL,
            work_date                 TEXT NOT NULL,
            work_type                 INTEGER NOT NULL DEFAULT 10,
            work_time_slot            TEXT,
            start_time                TEXT,
            start_time_next_day       INTEGER NOT NULL DEFAULT 0,
            end_time                  TEXT,
            end_time_next_day         INTEGER NOT NULL DEFAULT 0,
            break_minutes             INTEGER NOT NULL DEFAULT 0,
            late_night_break_minutes  INTEGER NOT NULL DEFAULT 0,
            paid_leave_days           TEXT NOT NULL DEFAULT '0',
            memo                      TEXT,
            work_minutes              INTEGER NOT NULL DEFAULT 0,
            overtime_minutes          INTEGER NOT NULL DEFAULT 0,
            late_night_minutes        INTEGER NOT NULL DEFAULT 0,
            holiday_work_minutes      INTEGER NOT NULL DEFAULT 0,
            UNIQUE (tenant_id, side, contract_id, staff_id, work_date)
        );

        CREATE TABLE IF NOT EXISTS timesheets (
            id                    INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id             INTEGER NOT NULL,
            side                  TEXT NOT NULL CHECK (side IN ('staff','client')),
            contract_id           INTEGER NOT NULL REFERENCES contracts(id),
            staff_id              INTEGER NOT NULL,
            target_month          TEXT NOT NULL,
            work_days             INTEGER NOT NULL DEFAULT 0,
            absence_days          INTEGER NOT NULL DEFAULT 0,
            paid_leave_days       TEXT NOT NULL DEFAULT '0',
            work_minutes          INTEGER NOT NULL DEFAULT 0,
            overtime_minutes      INTEGER NOT NULL DEFAULT 0,
            late_night_minutes    INTEGER NOT NULL DEFAULT 0,
            holiday_work_minutes  INTEGER NOT NULL DEFAULT 0,
            premium_minutes       INTEGER NOT NULL DEFAULT 0,
            deduction_minutes     INTEGER NOT NULL DEFAULT 0,
            variable_minutes      INTEGER NOT NULL DEFAULT 0,
            status                INTEGER NOT NULL DEFAULT 10,
            submitted_at          TEXT,
            submitted_by          TEXT,
            approved_at           TEXT,
            approved_by           TEXT,
            rejected_at           TEXT,
            rejected_by           TEXT,
            rejection_reason      TEXT,
            UNIQUE (tenant_id, side, contract_id, staff_id, target_month)
        );

        CREATE TABLE IF NOT EXISTS approvals (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            tenant_id          INTEGER NOT NULL,
            staff_id           INTEGER NOT NULL,
            staff_contract_id  INTEGER NOT NULL REFERENCES contracts(id),
            closing_date       TEXT NOT NULL,
            period_start       TEXT NOT NULL,
            period_end         TEXT NOT NULL,
            status             INTEGER NOT NULL DEFAULT 10,
            submitted_at       TEXT,
            submitted_by       TEXT,
            approved_at        TEXT,
            approved_by        TEXT,
            rejected_at        TEXT,
            rejected_by        TEXT,
            rejection_reason   TEXT,
            UNIQUE (tenant_id, staff_id, staff_contract_id, closing_date)
        );

        CREATE INDEX IF NOT EXISTS idx_approvals_staff_period
            ON approvals(tenant_id, staff_id, period_start, period_end);
        "#,
    },
    Migration {
        version: "20250301_0003_import_tasks",
        description: "background CSV import tasks",
        sql: r#"
        CREATE TABLE IF NOT EXISTS import_tasks (
            id               TEXT PRIMARY KEY,
            tenant_id        INTEGER NOT NULL,
            file_path        TEXT NOT NULL,
            status           TEXT NOT NULL,
            progress         INTEGER NOT NULL DEFAULT 0,
            total            INTEGER NOT NULL DEFAULT 0,
            imported_count   INTEGER NOT NULL DEFAULT 0,
            errors           TEXT NOT NULL DEFAULT '[]',
            start_time       TEXT,
            elapsed_seconds  REAL NOT NULL DEFAULT 0,
            eta_seconds      REAL
        );
        "#,
    },
];

/// Ensure that the `log` table exists; migrations are tracked in it.
fn ensure_log_table(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            date       TEXT NOT NULL,
            tenant_id  INTEGER NOT NULL DEFAULT 0,
            actor      TEXT NOT NULL DEFAULT 'system',
            operation  TEXT NOT NULL,
            target     TEXT DEFAULT '',
            message    TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

fn is_applied(conn: &Connection, version: &str) -> AppResult<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

fn apply(conn: &Connection, m: &Migration) -> AppResult<()> {
    conn.execute_batch(m.sql)
        .map_err(|e| AppError::Migration(format!("{}: {}", m.version, e)))?;

    conn.execute(
        "INSERT INTO log (date, operation, target, message)
         VALUES (datetime('now'), 'migration_applied', ?1, ?2)",
        params![m.version, m.description],
    )?;

    info!(version = m.version, "migration applied: {}", m.description);
    Ok(())
}

/// Public entry point: run all pending migrations.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<()> {
    ensure_log_table(conn)?;

    for m in MIGRATIONS {
        if !is_applied(conn, m.version)? {
            apply(conn, m)?;
        }
    }

    Ok(())
}

/// Versions recorded as applied, oldest first.
pub fn applied_versions(conn: &Connection) -> AppResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT target FROM log WHERE operation = 'migration_applied' ORDER BY id ASC",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
