//! Operator corrections of raw Timerecords and their breaks.
//!
//! Same rounding as the punch engine; the period lock and contract coverage
//! apply to every change.

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::info;

use crate::core::approval::ApprovalLogic;
use crate::core::policy::PolicyResolver;
use crate::core::rounding::{PunchKind, round_punch};
use crate::db::log::ttlog;
use crate::db::master::get_contract;
use crate::db::pool::DbPool;
use crate::db::timerecords::{
    delete_break, delete_record, find_break, get_record, insert_break, insert_record,
    update_break, update_record,
};
use crate::errors::{AppError, AppResult};
use crate::models::{ContractKind, Scope, TimePunchConfig, Timerecord, TimerecordBreak, Timestamp};

#[derive(Debug, Clone)]
pub struct TimerecordDraft {
    pub staff_contract_id: i64,
    pub work_date: NaiveDate,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub memo: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BreakDraft {
    pub break_start: Timestamp,
    pub break_end: Option<Timestamp>,
}

pub struct TimerecordLogic;

/// Contract checks shared by every edit. Returns the owning staff id and
/// the punch config in effect on `work_date`.
fn prepare(
    conn: &Connection,
    scope: &Scope,
    staff_contract_id: i64,
    work_date: NaiveDate,
) -> AppResult<(i64, Option<TimePunchConfig>)> {
    let contract = get_contract(conn, scope.tenant_id, staff_contract_id)?;
    let staff_id = match (contract.kind, contract.staff_id) {
        (ContractKind::Staff, Some(id)) => id,
        _ => {
            return Err(AppError::ConstraintViolated(format!(
                "contract {} is not a staff contract",
                contract.contract_number
            )));
        }
    };
    let policy = PolicyResolver::new(conn, scope.tenant_id).resolve_covered(&contract, work_date)?;
    ApprovalLogic::ensure_unlocked(conn, scope, staff_id, work_date)?;
    Ok((staff_id, policy.time_punch))
}

/// `start < end` and `start <= b.start < b.end <= end` on raw values.
pub fn check_containment(rec: &Timerecord) -> AppResult<()> {
    if let Some(end) = rec.end_time
        && end <= rec.start_time
    {
        return Err(AppError::ConstraintViolated(
            "timerecord must end after it starts".into(),
        ));
    }
    for b in &rec.breaks {
        let inside_start = rec.start_time <= b.break_start;
        let ordered = b.break_end.is_none_or(|e| b.break_start < e);
        let inside_end = match (rec.end_time, b.break_end) {
            (Some(end), Some(b_end)) => b_end <= end,
            (Some(end), None) => b.break_start < end,
            (None, _) => true,
        };
        if !(inside_start && ordered && inside_end) {
            return Err(AppError::ConstraintViolated(format!(
                "break starting {} is not inside the working time",
                b.break_start.to_rfc3339()
            )));
        }
    }
    Ok(())
}

fn apply_draft(rec: &mut Timerecord, draft: TimerecordDraft, cfg: Option<&TimePunchConfig>) {
    rec.staff_contract_id = draft.staff_contract_id;
    rec.work_date = draft.work_date;
    rec.start_time = draft.start_time;
    rec.rounded_start_time = round_punch(cfg, PunchKind::Start, draft.start_time);
    rec.end_time = draft.end_time;
    rec.rounded_end_time = draft.end_time.map(|e| round_punch(cfg, PunchKind::End, e));
    rec.memo = draft.memo;
}

fn apply_break_draft(b: &mut TimerecordBreak, draft: BreakDraft, cfg: Option<&TimePunchConfig>) {
    b.break_start = draft.break_start;
    b.rounded_break_start = round_punch(cfg, PunchKind::BreakStart, draft.break_start);
    b.break_end = draft.break_end;
    b.rounded_break_end = draft
        .break_end
        .map(|e| round_punch(cfg, PunchKind::BreakEnd, e));
}

fn log_change(conn: &Connection, scope: &Scope, op: &str, rec: &Timerecord) -> AppResult<()> {
    ttlog(
        conn,
        scope,
        op,
        &format!("timerecord:{}", rec.id),
        &format!(
            "contract={} date={}",
            rec.staff_contract_id,
            rec.work_date.format("%Y-%m-%d")
        ),
    )?;
    info!(record = rec.id, op, "timerecord changed");
    Ok(())
}

impl TimerecordLogic {
    pub fn create(pool: &mut DbPool, scope: &Scope, draft: TimerecordDraft) -> AppResult<Timerecord> {
        pool.immediate(|conn| {
            let (staff_id, cfg) = prepare(conn, scope, draft.staff_contract_id, draft.work_date)?;
            let mut rec = Timerecord {
                id: 0,
                staff_id,
                staff_contract_id: draft.staff_contract_id,
                work_date: draft.work_date,
                start_time: draft.start_time,
                end_time: None,
                rounded_start_time: draft.start_time,
                rounded_end_time: None,
                start_location: None,
                end_location: None,
                memo: None,
                breaks: Vec::new(),
            };
            apply_draft(&mut rec, draft, cfg.as_ref());
            check_containment(&rec)?;
            rec.id = insert_record(conn, scope.tenant_id, &rec)?;
            log_change(conn, scope, "timerecord_create", &rec)?;
            Ok(rec)
        })
    }

    pub fn update(
        pool: &mut DbPool,
        scope: &Scope,
        id: i64,
        draft: TimerecordDraft,
    ) -> AppResult<Timerecord> {
        pool.immediate(|conn| {
            let mut rec = get_record(conn, scope.tenant_id, id)?;
            // the old day must be editable as well as the new one
            prepare(conn, scope, rec.staff_contract_id, rec.work_date)?;
            let (staff_id, cfg) = prepare(conn, scope, draft.staff_contract_id, draft.work_date)?;
            if staff_id != rec.staff_id {
                return Err(AppError::ConstraintViolated(
                    "a timerecord cannot move to another staff member".into(),
                ));
            }
            apply_draft(&mut rec, draft, cfg.as_ref());
            check_containment(&rec)?;
            update_record(conn, scope.tenant_id, &rec)?;
            log_change(conn, scope, "timerecord_update", &rec)?;
            Ok(rec)
        })
    }

    pub fn delete(pool: &mut DbPool, scope: &Scope, id: i64) -> AppResult<()> {
        pool.immediate(|conn| {
            let rec = get_record(conn, scope.tenant_id, id)?;
            prepare(conn, scope, rec.staff_contract_id, rec.work_date)?;
            delete_record(conn, scope.tenant_id, id)?;
            log_change(conn, scope, "timerecord_delete", &rec)
        })
    }

    pub fn add_break(
        pool: &mut DbPool,
        scope: &Scope,
        record_id: i64,
        draft: BreakDraft,
    ) -> AppResult<Timerecord> {
        pool.immediate(|conn| {
            let mut rec = get_record(conn, scope.tenant_id, record_id)?;
            let (_, cfg) = prepare(conn, scope, rec.staff_contract_id, rec.work_date)?;
            let mut b = TimerecordBreak {
                id: 0,
                timerecord_id: rec.id,
                break_start: draft.break_start,
                break_end: None,
                rounded_break_start: draft.break_start,
                rounded_break_end: None,
                start_location: None,
                end_location: None,
            };
            apply_break_draft(&mut b, draft, cfg.as_ref());
            rec.breaks.push(b.clone());
            check_containment(&rec)?;
            insert_break(conn, scope.tenant_id, &b)?;
            log_change(conn, scope, "break_create", &rec)?;
            get_record(conn, scope.tenant_id, record_id)
        })
    }

    pub fn update_break(
        pool: &mut DbPool,
        scope: &Scope,
        break_id: i64,
        draft: BreakDraft,
    ) -> AppResult<Timerecord> {
        pool.immediate(|conn| {
            let (mut rec, cfg) = load_for_break(conn, scope, break_id)?;
            let Some(b) = rec.breaks.iter_mut().find(|b| b.id == break_id) else {
                return Err(AppError::NotFound(format!("break {break_id}")));
            };
            apply_break_draft(b, draft, cfg.as_ref());
            let updated = b.clone();
            check_containment(&rec)?;
            update_break(conn, scope.tenant_id, &updated)?;
            log_change(conn, scope, "break_update", &rec)?;
            Ok(rec)
        })
    }

    pub fn delete_break(pool: &mut DbPool, scope: &Scope, break_id: i64) -> AppResult<Timerecord> {
        pool.immediate(|conn| {
            let (mut rec, _) = load_for_break(conn, scope, break_id)?;
            delete_break(conn, scope.tenant_id, break_id)?;
            rec.breaks.retain(|b| b.id != break_id);
            log_change(conn, scope, "break_delete", &rec)?;
            Ok(rec)
        })
    }
}

fn load_for_break(
    conn: &Connection,
    scope: &Scope,
    break_id: i64,
) -> AppResult<(Timerecord, Option<TimePunchConfig>)> {
    let b = find_break(conn, scope.tenant_id, break_id)?
        .ok_or_else(|| AppError::NotFound(format!("break {break_id}")))?;
    let rec = get_record(conn, scope.tenant_id, b.timerecord_id)?;
    let (_, cfg) = prepare(conn, scope, rec.staff_contract_id, rec.work_date)?;
    Ok((rec, cfg))
}
