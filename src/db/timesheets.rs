//! Monthly aggregate rows.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::db::db_utils::{conversion_error, get_decimal, get_opt_ts, ts_to_db};
use crate::errors::{AppError, AppResult};
use crate::models::{ApprovalStatus, CardOwner, MonthlyTotals, Side, Timesheet, YearMonth};

fn map_sheet(row: &Row) -> rusqlite::Result<Timesheet> {
    let side_str: String = row.get("side")?;
    let side = Side::from_db_str(&side_str).ok_or_else(|| {
        conversion_error(AppError::ConstraintViolated(format!("invalid side: {side_str}")))
    })?;
    let month_str: String = row.get("target_month")?;
    let target_month: YearMonth = month_str.parse().map_err(conversion_error)?;
    let code: i64 = row.get("status")?;
    let status = ApprovalStatus::from_code(code).ok_or_else(|| {
        conversion_error(AppError::ConstraintViolated(format!("invalid status: {code}")))
    })?;

    Ok(Timesheet {
        id: row.get("id")?,
        owner: CardOwner {
            side,
            contract_id: row.get("contract_id")?,
            staff_id: row.get("staff_id")?,
        },
        target_month,
        totals: MonthlyTotals {
            work_days: row.get("work_days")?,
            absence_days: row.get("absence_days")?,
            paid_leave_days: get_decimal(row, "paid_leave_days")?,
            work_minutes: row.get("work_minutes")?,
            overtime_minutes: row.get("overtime_minutes")?,
            late_night_minutes: row.get("late_night_minutes")?,
            holiday_work_minutes: row.get("holiday_work_minutes")?,
            premium_minutes: row.get("premium_minutes")?,
            deduction_minutes: row.get("deduction_minutes")?,
            variable_minutes: row.get("variable_minutes")?,
        },
        status,
        submitted_at: get_opt_ts(row, "submitted_at")?,
        submitted_by: row.get("submitted_by")?,
        approved_at: get_opt_ts(row, "approved_at")?,
        approved_by: row.get("approved_by")?,
        rejected_at: get_opt_ts(row, "rejected_at")?,
        rejected_by: row.get("rejected_by")?,
        rejection_reason: row.get("rejection_reason")?,
    })
}

pub fn find_sheet(
    conn: &Connection,
    tenant_id: i64,
    owner: &CardOwner,
    month: YearMonth,
) -> AppResult<Option<Timesheet>> {
    Ok(conn
        .query_row(
            "SELECT * FROM timesheets
             WHERE tenant_id = ?1 AND side = ?2 AND contract_id = ?3 AND staff_id = ?4
               AND target_month = ?5",
            params![
                tenant_id,
                owner.side.to_db_str(),
                owner.contract_id,
                owner.staff_id,
                month.to_db_str()
            ],
            map_sheet,
        )
        .optional()?)
}

/// Return the existing row or create an empty DRAFT one.
pub fn ensure_sheet(
    conn: &Connection,
    tenant_id: i64,
    owner: &CardOwner,
    month: YearMonth,
) -> AppResult<Timesheet> {
    conn.execute(
        "INSERT OR IGNORE INTO timesheets (tenant_id, side, contract_id, staff_id, target_month,
                                           status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            tenant_id,
            owner.side.to_db_str(),
            owner.contract_id,
            owner.staff_id,
            month.to_db_str(),
            ApprovalStatus::Draft.code()
        ],
    )?;
    find_sheet(conn, tenant_id, owner, month)?
        .ok_or_else(|| AppError::NotFound(format!("timesheet {owner} {month}")))
}

pub fn update_totals(
    conn: &Connection,
    tenant_id: i64,
    sheet_id: i64,
    t: &MonthlyTotals,
) -> AppResult<()> {
    conn.execute(
        "UPDATE timesheets
         SET work_days = ?3, absence_days = ?4, paid_leave_days = ?5, work_minutes = ?6,
             overtime_minutes = ?7, late_night_minutes = ?8, holiday_work_minutes = ?9,
             premium_minutes = ?10, deduction_minutes = ?11, variable_minutes = ?12
         WHERE tenant_id = ?1 AND id = ?2",
        params![
            tenant_id,
            sheet_id,
            t.work_days,
            t.absence_days,
            t.paid_leave_days.to_string(),
            t.work_minutes,
            t.overtime_minutes,
            t.late_night_minutes,
            t.holiday_work_minutes,
            t.premium_minutes,
            t.deduction_minutes,
            t.variable_minutes,
        ],
    )?;
    Ok(())
}

/// Persist status plus the submitted/approved/rejected metadata.
pub fn update_status(conn: &Connection, tenant_id: i64, sheet: &Timesheet) -> AppResult<()> {
    conn.execute(
        "UPDATE timesheets
         SET status = ?3, submitted_at = ?4, submitted_by = ?5, approved_at = ?6,
             approved_by = ?7, rejected_at = ?8, rejected_by = ?9, rejection_reason = ?10
         WHERE tenant_id = ?1 AND id = ?2",
        params![
            tenant_id,
            sheet.id,
            sheet.status.code(),
            sheet.submitted_at.as_ref().map(ts_to_db),
            sheet.submitted_by,
            sheet.approved_at.as_ref().map(ts_to_db),
            sheet.approved_by,
            sheet.rejected_at.as_ref().map(ts_to_db),
            sheet.rejected_by,
            sheet.rejection_reason,
        ],
    )?;
    Ok(())
}

pub fn delete_sheet(conn: &Connection, tenant_id: i64, id: i64) -> AppResult<()> {
    conn.execute(
        "DELETE FROM timesheets WHERE tenant_id = ?1 AND id = ?2",
        params![tenant_id, id],
    )?;
    Ok(())
}
