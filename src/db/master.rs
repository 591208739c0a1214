//! Master data: staff, contracts, assignments and policy patterns.
//!
//! Rows are read-only for the attendance core; inserts are used by the
//! master-data loader and by tests.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::db::db_utils::{
    bool_to_db, conversion_error, date_to_db, get_bool, get_date, get_opt_date, time_to_db,
};
use crate::errors::{AppError, AppResult};
use crate::models::overtime::OvertimePatternRow;
use crate::models::{
    Assignment, Contract, ContractKind, ContractStatus, OvertimePattern, PunchMethod,
    RoundingMethod, RoundingRule, SlotBreak, Staff, TimePunchConfig, WorkTimePattern,
    WorkTimeSlot,
};
use crate::utils::time::parse_time;

/// `None` lets SQLite assign the id.
fn explicit_id(id: i64) -> Option<i64> {
    (id != 0).then_some(id)
}

// ---------------------------
// Staff
// ---------------------------

fn map_staff(row: &Row) -> rusqlite::Result<Staff> {
    Ok(Staff {
        id: row.get("id")?,
        employee_no: row.get("employee_no")?,
        name: row.get("name")?,
    })
}

pub fn insert_staff(conn: &Connection, tenant_id: i64, staff: &Staff) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO staff (id, tenant_id, employee_no, name) VALUES (?1, ?2, ?3, ?4)",
        params![explicit_id(staff.id), tenant_id, staff.employee_no, staff.name],
    )
    .map_err(|e| AppError::from_unique(e, "staff"))?;
    Ok(conn.last_insert_rowid())
}

pub fn find_staff_by_employee_no(
    conn: &Connection,
    tenant_id: i64,
    employee_no: &str,
) -> AppResult<Option<Staff>> {
    Ok(conn
        .query_row(
            "SELECT * FROM staff WHERE tenant_id = ?1 AND employee_no = ?2",
            params![tenant_id, employee_no],
            map_staff,
        )
        .optional()?)
}

// ---------------------------
// Contracts
// ---------------------------

fn map_contract(row: &Row) -> rusqlite::Result<Contract> {
    let kind_str: String = row.get("kind")?;
    let kind = ContractKind::from_db_str(&kind_str).ok_or_else(|| {
        conversion_error(AppError::ConstraintViolated(format!(
            "invalid contract kind: {kind_str}"
        )))
    })?;
    let status_code: i64 = row.get("status")?;
    let status = ContractStatus::from_code(status_code).ok_or_else(|| {
        conversion_error(AppError::ConstraintViolated(format!(
            "invalid contract status: {status_code}"
        )))
    })?;

    Ok(Contract {
        id: row.get("id")?,
        kind,
        contract_number: row.get("contract_number")?,
        staff_id: row.get("staff_id")?,
        client_name: row.get("client_name")?,
        status,
        start_date: get_date(row, "start_date")?,
        end_date: get_opt_date(row, "end_date")?,
        time_punch_id: row.get("time_punch_id")?,
        work_time_pattern_id: row.get("work_time_pattern_id")?,
        overtime_pattern_id: row.get("overtime_pattern_id")?,
    })
}

pub fn insert_contract(conn: &Connection, tenant_id: i64, c: &Contract) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO contracts (id, tenant_id, kind, contract_number, staff_id, client_name,
                                status, start_date, end_date, time_punch_id,
                                work_time_pattern_id, overtime_pattern_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            explicit_id(c.id),
            tenant_id,
            c.kind.to_db_str(),
            c.contract_number,
            c.staff_id,
            c.client_name,
            c.status.code(),
            date_to_db(c.start_date),
            c.end_date.map(date_to_db),
            c.time_punch_id,
            c.work_time_pattern_id,
            c.overtime_pattern_id,
        ],
    )
    .map_err(|e| AppError::from_unique(e, "contract number"))?;
    Ok(conn.last_insert_rowid())
}

pub fn find_contract(conn: &Connection, tenant_id: i64, id: i64) -> AppResult<Option<Contract>> {
    Ok(conn
        .query_row(
            "SELECT * FROM contracts WHERE tenant_id = ?1 AND id = ?2",
            params![tenant_id, id],
            map_contract,
        )
        .optional()?)
}

/// Like [`find_contract`] but absent rows are `NotFound`.
pub fn get_contract(conn: &Connection, tenant_id: i64, id: i64) -> AppResult<Contract> {
    find_contract(conn, tenant_id, id)?
        .ok_or_else(|| AppError::NotFound(format!("contract {id}")))
}

pub fn find_contract_by_number(
    conn: &Connection,
    tenant_id: i64,
    number: &str,
) -> AppResult<Option<Contract>> {
    Ok(conn
        .query_row(
            "SELECT * FROM contracts WHERE tenant_id = ?1 AND contract_number = ?2",
            params![tenant_id, number],
            map_contract,
        )
        .optional()?)
}

/// Staff contracts of one staff member, newest start first.
pub fn staff_contracts_of(
    conn: &Connection,
    tenant_id: i64,
    staff_id: i64,
) -> AppResult<Vec<Contract>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM contracts
         WHERE tenant_id = ?1 AND kind = 'staff' AND staff_id = ?2
         ORDER BY start_date DESC, id DESC",
    )?;
    let rows = stmt.query_map(params![tenant_id, staff_id], map_contract)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

// ---------------------------
// Assignments
// ---------------------------

fn map_assignment(row: &Row) -> rusqlite::Result<Assignment> {
    Ok(Assignment {
        id: row.get("id")?,
        staff_contract_id: row.get("staff_contract_id")?,
        client_contract_id: row.get("client_contract_id")?,
        start_date: get_date(row, "start_date")?,
        end_date: get_opt_date(row, "end_date")?,
    })
}

pub fn insert_assignment(conn: &Connection, tenant_id: i64, a: &Assignment) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO assignments (id, tenant_id, staff_contract_id, client_contract_id,
                                  start_date, end_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            explicit_id(a.id),
            tenant_id,
            a.staff_contract_id,
            a.client_contract_id,
            date_to_db(a.start_date),
            a.end_date.map(date_to_db),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn assignments_of(
    conn: &Connection,
    tenant_id: i64,
    staff_contract_id: i64,
) -> AppResult<Vec<Assignment>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM assignments
         WHERE tenant_id = ?1 AND staff_contract_id = ?2
         ORDER BY start_date ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![tenant_id, staff_contract_id], map_assignment)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

// ---------------------------
// Time punch configs
// ---------------------------

fn get_rule(row: &Row, prefix: &str) -> rusqlite::Result<RoundingRule> {
    let unit: i64 = row.get(format!("{prefix}_unit").as_str())?;
    let method_str: String = row.get(format!("{prefix}_method").as_str())?;
    let method = RoundingMethod::from_db_str(&method_str).ok_or_else(|| {
        conversion_error(AppError::ConstraintViolated(format!(
            "invalid rounding method: {method_str}"
        )))
    })?;
    Ok(RoundingRule {
        unit: u32::try_from(unit.max(0)).unwrap_or(1),
        method,
    })
}

fn map_time_punch(row: &Row) -> rusqlite::Result<TimePunchConfig> {
    let method_str: String = row.get("punch_method")?;
    let punch_method = PunchMethod::from_db_str(&method_str).ok_or_else(|| {
        conversion_error(AppError::ConstraintViolated(format!(
            "invalid punch method: {method_str}"
        )))
    })?;
    Ok(TimePunchConfig {
        id: row.get("id")?,
        name: row.get("name")?,
        start: get_rule(row, "start")?,
        end: get_rule(row, "end")?,
        break_input: get_bool(row, "break_input")?,
        break_start: get_rule(row, "break_start")?,
        break_end: get_rule(row, "break_end")?,
        punch_method,
        location_info: get_bool(row, "location_info")?,
    })
}

pub fn insert_time_punch_config(
    conn: &Connection,
    tenant_id: i64,
    cfg: &TimePunchConfig,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO time_punch_configs (id, tenant_id, name, start_unit, start_method,
                                         end_unit, end_method, break_input,
                                         break_start_unit, break_start_method,
                                         break_end_unit, break_end_method,
                                         punch_method, location_info)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            explicit_id(cfg.id),
            tenant_id,
            cfg.name,
            cfg.start.unit,
            cfg.start.method.to_db_str(),
            cfg.end.unit,
            cfg.end.method.to_db_str(),
            bool_to_db(cfg.break_input),
            cfg.break_start.unit,
            cfg.break_start.method.to_db_str(),
            cfg.break_end.unit,
            cfg.break_end.method.to_db_str(),
            cfg.punch_method.to_db_str(),
            bool_to_db(cfg.location_info),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_time_punch_config(
    conn: &Connection,
    tenant_id: i64,
    id: i64,
) -> AppResult<Option<TimePunchConfig>> {
    Ok(conn
        .query_row(
            "SELECT * FROM time_punch_configs WHERE tenant_id = ?1 AND id = ?2",
            params![tenant_id, id],
            map_time_punch,
        )
        .optional()?)
}

// ---------------------------
// Work time patterns
// ---------------------------

fn map_slot(row: &Row) -> rusqlite::Result<WorkTimeSlot> {
    let start_raw: String = row.get("start_time")?;
    let end_raw: String = row.get("end_time")?;
    let breaks_raw: String = row.get("breaks")?;

    let start_time = parse_time(&start_raw)
        .ok_or_else(|| conversion_error(AppError::InvalidTime(start_raw.clone())))?;
    let end_time = parse_time(&end_raw)
        .ok_or_else(|| conversion_error(AppError::InvalidTime(end_raw.clone())))?;
    let breaks: Vec<SlotBreak> =
        serde_json::from_str(&breaks_raw).map_err(|e| conversion_error(AppError::Json(e)))?;

    Ok(WorkTimeSlot {
        name: row.get("name")?,
        start_time,
        end_time,
        breaks,
    })
}

pub fn insert_work_time_pattern(
    conn: &Connection,
    tenant_id: i64,
    pattern: &WorkTimePattern,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO work_time_patterns (id, tenant_id, name) VALUES (?1, ?2, ?3)",
        params![explicit_id(pattern.id), tenant_id, pattern.name],
    )?;
    let pattern_id = conn.last_insert_rowid();

    for (position, slot) in pattern.slots.iter().enumerate() {
        conn.execute(
            "INSERT INTO work_time_slots (tenant_id, pattern_id, position, name,
                                          start_time, end_time, breaks)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                tenant_id,
                pattern_id,
                position as i64,
                slot.name,
                time_to_db(slot.start_time),
                time_to_db(slot.end_time),
                serde_json::to_string(&slot.breaks)?,
            ],
        )?;
    }
    Ok(pattern_id)
}

pub fn find_work_time_pattern(
    conn: &Connection,
    tenant_id: i64,
    id: i64,
) -> AppResult<Option<WorkTimePattern>> {
    let name: Option<String> = conn
        .query_row(
            "SELECT name FROM work_time_patterns WHERE tenant_id = ?1 AND id = ?2",
            params![tenant_id, id],
            |row| row.get(0),
        )
        .optional()?;
    let Some(name) = name else {
        return Ok(None);
    };

    let mut stmt = conn.prepare(
        "SELECT * FROM work_time_slots
         WHERE tenant_id = ?1 AND pattern_id = ?2
         ORDER BY position ASC",
    )?;
    let rows = stmt.query_map(params![tenant_id, id], map_slot)?;
    let mut slots = Vec::new();
    for r in rows {
        slots.push(r?);
    }

    Ok(Some(WorkTimePattern { id, name, slots }))
}

// ---------------------------
// Overtime patterns
// ---------------------------

fn map_overtime_row(row: &Row) -> rusqlite::Result<OvertimePatternRow> {
    Ok(OvertimePatternRow {
        id: row.get("id")?,
        name: row.get("name")?,
        calculation_type: row.get("calculation_type")?,
        calculate_midnight_premium: get_bool(row, "calculate_midnight_premium")?,
        daily_overtime_enabled: get_bool(row, "daily_overtime_enabled")?,
        daily_overtime_hours: row.get("daily_overtime_hours")?,
        daily_overtime_minutes: row.get("daily_overtime_minutes")?,
        monthly_overtime_enabled: get_bool(row, "monthly_overtime_enabled")?,
        monthly_overtime_hours: row.get("monthly_overtime_hours")?,
        monthly_range_min: row.get("monthly_range_min")?,
        monthly_range_max: row.get("monthly_range_max")?,
        days: [
            (row.get("days_28_hours")?, row.get("days_28_minutes")?),
            (row.get("days_29_hours")?, row.get("days_29_minutes")?),
            (row.get("days_30_hours")?, row.get("days_30_minutes")?),
            (row.get("days_31_hours")?, row.get("days_31_minutes")?),
        ],
    })
}

pub fn insert_overtime_pattern(
    conn: &Connection,
    tenant_id: i64,
    pattern: &OvertimePattern,
) -> AppResult<i64> {
    let r = OvertimePatternRow::from(pattern);
    let [d28, d29, d30, d31] = r.days;
    conn.execute(
        "INSERT INTO overtime_patterns (id, tenant_id, name, calculation_type,
                                        calculate_midnight_premium,
                                        daily_overtime_enabled, daily_overtime_hours,
                                        daily_overtime_minutes, monthly_overtime_enabled,
                                        monthly_overtime_hours, monthly_range_min,
                                        monthly_range_max,
                                        days_28_hours, days_28_minutes,
                                        days_29_hours, days_29_minutes,
                                        days_30_hours, days_30_minutes,
                                        days_31_hours, days_31_minutes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                 ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
        params![
            explicit_id(r.id),
            tenant_id,
            r.name,
            r.calculation_type,
            bool_to_db(r.calculate_midnight_premium),
            bool_to_db(r.daily_overtime_enabled),
            r.daily_overtime_hours,
            r.daily_overtime_minutes,
            bool_to_db(r.monthly_overtime_enabled),
            r.monthly_overtime_hours,
            r.monthly_range_min,
            r.monthly_range_max,
            d28.0,
            d28.1,
            d29.0,
            d29.1,
            d30.0,
            d30.1,
            d31.0,
            d31.1,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_overtime_pattern(
    conn: &Connection,
    tenant_id: i64,
    id: i64,
) -> AppResult<Option<OvertimePattern>> {
    let row = conn
        .query_row(
            "SELECT * FROM overtime_patterns WHERE tenant_id = ?1 AND id = ?2",
            params![tenant_id, id],
            map_overtime_row,
        )
        .optional()?;
    row.map(OvertimePattern::try_from).transpose()
}
