//! Approvals: submitted closing periods per staff contract.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::db::db_utils::{conversion_error, date_to_db, get_date, get_opt_ts, ts_to_db};
use crate::errors::{AppError, AppResult};
use crate::models::{Approval, ApprovalStatus};

fn map_approval(row: &Row) -> rusqlite::Result<Approval> {
    let code: i64 = row.get("status")?;
    let status = ApprovalStatus::from_code(code).ok_or_else(|| {
        conversion_error(AppError::ConstraintViolated(format!("invalid status: {code}")))
    })?;
    Ok(Approval {
        id: row.get("id")?,
        staff_id: row.get("staff_id")?,
        staff_contract_id: row.get("staff_contract_id")?,
        closing_date: get_date(row, "closing_date")?,
        period_start: get_date(row, "period_start")?,
        period_end: get_date(row, "period_end")?,
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

fn collect(
    rows: impl Iterator<Item = rusqlite::Result<Approval>>,
) -> AppResult<Vec<Approval>> {
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn find_approval(conn: &Connection, tenant_id: i64, id: i64) -> AppResult<Option<Approval>> {
    Ok(conn
        .query_row(
            "SELECT * FROM approvals WHERE tenant_id = ?1 AND id = ?2",
            params![tenant_id, id],
            map_approval,
        )
        .optional()?)
}

pub fn find_by_key(
    conn: &Connection,
    tenant_id: i64,
    staff_id: i64,
    staff_contract_id: i64,
    closing_date: NaiveDate,
) -> AppResult<Option<Approval>> {
    Ok(conn
        .query_row(
            "SELECT * FROM approvals
             WHERE tenant_id = ?1 AND staff_id = ?2 AND staff_contract_id = ?3
               AND closing_date = ?4",
            params![tenant_id, staff_id, staff_contract_id, date_to_db(closing_date)],
            map_approval,
        )
        .optional()?)
}

/// All approvals of a staff member closing on `closing_date`.
pub fn approvals_for_closing(
    conn: &Connection,
    tenant_id: i64,
    staff_id: i64,
    closing_date: NaiveDate,
) -> AppResult<Vec<Approval>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM approvals
         WHERE tenant_id = ?1 AND staff_id = ?2 AND closing_date = ?3
         ORDER BY staff_contract_id ASC",
    )?;
    let rows = stmt.query_map(
        params![tenant_id, staff_id, date_to_db(closing_date)],
        map_approval,
    )?;
    collect(rows)
}

/// Is there a SUBMITTED or APPROVED approval of the staff member covering `date`?
pub fn has_locking_approval(
    conn: &Connection,
    tenant_id: i64,
    staff_id: i64,
    date: NaiveDate,
) -> AppResult<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM approvals
             WHERE tenant_id = ?1 AND staff_id = ?2
               AND status IN (?3, ?4)
               AND period_start <= ?5 AND ?5 <= period_end
             LIMIT 1",
            params![
                tenant_id,
                staff_id,
                ApprovalStatus::Submitted.code(),
                ApprovalStatus::Approved.code(),
                date_to_db(date)
            ],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn insert_approval(conn: &Connection, tenant_id: i64, a: &Approval) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO approvals (tenant_id, staff_id, staff_contract_id, closing_date,
                                period_start, period_end, status, submitted_at, submitted_by,
                                approved_at, approved_by, rejected_at, rejected_by,
                                rejection_reason)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            tenant_id,
            a.staff_id,
            a.staff_contract_id,
            date_to_db(a.closing_date),
            date_to_db(a.period_start),
            date_to_db(a.period_end),
            a.status.code(),
            a.submitted_at.as_ref().map(ts_to_db),
            a.submitted_by,
            a.approved_at.as_ref().map(ts_to_db),
            a.approved_by,
            a.rejected_at.as_ref().map(ts_to_db),
            a.rejected_by,
            a.rejection_reason,
        ],
    )
    .map_err(|e| AppError::from_unique(e, "approval for this closing date"))?;
    Ok(conn.last_insert_rowid())
}

pub fn update_approval(conn: &Connection, tenant_id: i64, a: &Approval) -> AppResult<()> {
    conn.execute(
        "UPDATE approvals
         SET period_start = ?3, period_end = ?4, status = ?5, submitted_at = ?6,
             submitted_by = ?7, approved_at = ?8, approved_by = ?9, rejected_at = ?10,
             rejected_by = ?11, rejection_reason = ?12
         WHERE tenant_id = ?1 AND id = ?2",
        params![
            tenant_id,
            a.id,
            date_to_db(a.period_start),
            date_to_db(a.period_end),
            a.status.code(),
            a.submitted_at.as_ref().map(ts_to_db),
            a.submitted_by,
            a.approved_at.as_ref().map(ts_to_db),
            a.approved_by,
            a.rejected_at.as_ref().map(ts_to_db),
            a.rejected_by,
            a.rejection_reason,
        ],
    )?;
    Ok(())
}
