//! Daily Timecard writes.
//!
//! Writing a day and recomputing its month are two separate steps: bulk
//! writers pass `skip_timesheet_update` and recompute each touched month
//! once at the end.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tracing::debug;

use crate::core::approval::ApprovalLogic;
use crate::core::calculator::daily::{compute_daily, shift_bounds};
use crate::core::calculator::monthly::is_valid_paid_leave;
use crate::core::policy::PolicyResolver;
use crate::core::timesheet::TimesheetLogic;
use crate::db::log::ttlog;
use crate::db::master::get_contract;
use crate::db::pool::DbPool;
use crate::db::timecards::{cards_of_month, delete_card, upsert_card};
use crate::db::timesheets::{ensure_sheet, find_sheet};
use crate::errors::{AppError, AppResult};
use crate::models::{
    CardOwner, Contract, ContractKind, Scope, Side, Timecard, WorkType, YearMonth,
};

pub struct TimecardLogic;

impl TimecardLogic {
    /// Field-level checks that need no database access.
    pub fn validate(card: &Timecard) -> AppResult<()> {
        if card.break_minutes < 0 || card.late_night_break_minutes < 0 {
            return Err(AppError::ConstraintViolated(
                "break minutes cannot be negative".into(),
            ));
        }
        if !is_valid_paid_leave(card.paid_leave_days) {
            return Err(AppError::ConstraintViolated(format!(
                "paid_leave_days must be 0, 0.5 or 1 (got {})",
                card.paid_leave_days
            )));
        }
        if card.work_type == WorkType::PaidLeave && card.paid_leave_days <= Decimal::ZERO {
            return Err(AppError::ConstraintViolated(
                "paid leave requires paid_leave_days > 0".into(),
            ));
        }

        match (card.start_time, card.end_time) {
            (Some(start), Some(end)) => {
                if !card.start_time_next_day && !card.end_time_next_day && end <= start {
                    return Err(AppError::ConstraintViolated(format!(
                        "end {} is not after start {} (set the next-day flag for overnight shifts)",
                        end.format("%H:%M"),
                        start.format("%H:%M")
                    )));
                }
                if let Some((s, e)) = shift_bounds(card)
                    && e <= s
                {
                    return Err(AppError::ConstraintViolated(
                        "end is not after start".into(),
                    ));
                }
            }
            _ if card.work_type.is_work() => {
                return Err(AppError::ConstraintViolated(
                    "a working day needs both start and end time".into(),
                ));
            }
            _ => {}
        }
        Ok(())
    }

    /// Validate and store one day, computing its counters, without touching
    /// the monthly totals. The Timesheet row of the month is created if
    /// missing.
    pub fn write_day(conn: &Connection, scope: &Scope, draft: Timecard) -> AppResult<Timecard> {
        let mut resolver = PolicyResolver::new(conn, scope.tenant_id);
        write(conn, scope, &mut resolver, draft, true)
    }

    /// `write_day` plus, unless skipped, the month recomputation, as one
    /// transaction.
    pub fn save(
        pool: &mut DbPool,
        scope: &Scope,
        draft: Timecard,
        skip_timesheet_update: bool,
    ) -> AppResult<Timecard> {
        pool.immediate(|conn| Self::save_in(conn, scope, draft, skip_timesheet_update))
    }

    /// [`Self::save`] inside an already open transaction.
    pub fn save_in(
        conn: &Connection,
        scope: &Scope,
        draft: Timecard,
        skip_timesheet_update: bool,
    ) -> AppResult<Timecard> {
        let card = Self::write_day(conn, scope, draft)?;
        if !skip_timesheet_update {
            TimesheetLogic::recompute(conn, scope, card.owner, YearMonth::from_date(card.work_date))?;
        }
        Ok(card)
    }

    /// Remove one day and recompute its month.
    pub fn delete(
        pool: &mut DbPool,
        scope: &Scope,
        owner: CardOwner,
        work_date: NaiveDate,
    ) -> AppResult<()> {
        pool.immediate(|conn| {
            ensure_editable(conn, scope, &owner, work_date)?;
            if !delete_card(conn, scope.tenant_id, &owner, work_date)? {
                return Err(AppError::NotFound(format!(
                    "timecard {owner} {}",
                    work_date.format("%Y-%m-%d")
                )));
            }
            ttlog(
                conn,
                scope,
                "timecard_delete",
                &format!("{owner} {}", work_date.format("%Y-%m-%d")),
                "deleted",
            )?;
            TimesheetLogic::recompute(conn, scope, owner, YearMonth::from_date(work_date))?;
            Ok(())
        })
    }

    pub fn list(
        conn: &Connection,
        scope: &Scope,
        owner: CardOwner,
        month: YearMonth,
    ) -> AppResult<Vec<Timecard>> {
        cards_of_month(conn, scope.tenant_id, &owner, month)
    }

    /// Write path of the approval sync: same validation and counters, but the
    /// period lock is not consulted since the approval itself holds it.
    pub(crate) fn write_synced(
        conn: &Connection,
        scope: &Scope,
        resolver: &mut PolicyResolver<'_>,
        draft: Timecard,
    ) -> AppResult<Timecard> {
        write(conn, scope, resolver, draft, false)
    }
}

fn check_owner(contract: &Contract, owner: &CardOwner) -> AppResult<()> {
    match (owner.side, contract.kind) {
        (Side::Staff, ContractKind::Staff) if contract.staff_id == Some(owner.staff_id) => Ok(()),
        (Side::Staff, ContractKind::Staff) => Err(AppError::ConstraintViolated(format!(
            "contract {} does not belong to staff {}",
            contract.contract_number, owner.staff_id
        ))),
        (Side::Client, ContractKind::Client) => Ok(()),
        _ => Err(AppError::ConstraintViolated(format!(
            "contract {} is not a {} contract",
            contract.contract_number,
            owner.side.to_db_str()
        ))),
    }
}

/// Period lock of the staff member plus the Timesheet status of the month.
fn ensure_editable(
    conn: &Connection,
    scope: &Scope,
    owner: &CardOwner,
    work_date: NaiveDate,
) -> AppResult<()> {
    ApprovalLogic::ensure_unlocked(conn, scope, owner.staff_id, work_date)?;
    let month = YearMonth::from_date(work_date);
    if let Some(sheet) = find_sheet(conn, scope.tenant_id, owner, month)?
        && !sheet.status.is_editable()
    {
        return Err(AppError::LockedPeriod(format!(
            "timesheet {owner} {month} is {}",
            sheet.status.as_str()
        )));
    }
    Ok(())
}

fn write(
    conn: &Connection,
    scope: &Scope,
    resolver: &mut PolicyResolver<'_>,
    mut card: Timecard,
    enforce_locks: bool,
) -> AppResult<Timecard> {
    let contract = get_contract(conn, scope.tenant_id, card.owner.contract_id)?;
    check_owner(&contract, &card.owner)?;

    let policy = resolver.resolve_covered(&contract, card.work_date)?;

    if let Some(name) = card.work_time_slot.clone() {
        let slot = policy
            .work_time
            .as_ref()
            .and_then(|p| p.slot(&name))
            .ok_or_else(|| AppError::NotFound(format!("work time slot '{name}'")))?;
        if card.start_time.is_none() && card.end_time.is_none() {
            card.apply_slot(slot);
        }
    }

    TimecardLogic::validate(&card)?;

    if enforce_locks {
        ensure_editable(conn, scope, &card.owner, card.work_date)?;
    }

    card.counters = compute_daily(&card, policy.overtime.as_ref());
    card.id = upsert_card(conn, scope.tenant_id, &card)?;
    ensure_sheet(
        conn,
        scope.tenant_id,
        &card.owner,
        YearMonth::from_date(card.work_date),
    )?;

    ttlog(
        conn,
        scope,
        "timecard_write",
        &format!("{} {}", card.owner, card.work_date.format("%Y-%m-%d")),
        &format!(
            "type={} work={} overtime={} late_night={} holiday={}",
            card.work_type.code(),
            card.counters.work_minutes,
            card.counters.overtime_minutes,
            card.counters.late_night_minutes,
            card.counters.holiday_work_minutes
        ),
    )?;
    debug!(owner = %card.owner, date = %card.work_date, "timecard written");

    Ok(card)
}
