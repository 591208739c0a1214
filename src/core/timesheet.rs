//! Monthly recomputation and the Timesheet status machine.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::core::approval::ApprovalLogic;
use crate::core::calculator::compute_monthly;
use crate::core::policy::PolicyResolver;
use crate::db::log::ttlog;
use crate::db::master::get_contract;
use crate::db::pool::DbPool;
use crate::db::timecards::{cards_of_month, delete_cards_of_month};
use crate::db::timesheets::{delete_sheet, ensure_sheet, find_sheet, update_status, update_totals};
use crate::errors::{AppError, AppResult};
use crate::models::{ApprovalStatus, CardOwner, Scope, Timesheet, Timestamp, YearMonth};

pub struct TimesheetLogic;

/// Status change requested on a Timesheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetTransition {
    Submit,
    Withdraw,
    Approve,
    Reject { reason: String },
}

impl SheetTransition {
    fn name(&self) -> &'static str {
        match self {
            SheetTransition::Submit => "submit",
            SheetTransition::Withdraw => "withdraw",
            SheetTransition::Approve => "approve",
            SheetTransition::Reject { .. } => "reject",
        }
    }
}

impl TimesheetLogic {
    /// Fold the month's Timecards into the Timesheet and apply the regime.
    ///
    /// Creates the Timesheet when missing. Runs inside the caller's
    /// transaction and is idempotent.
    pub fn recompute(
        conn: &Connection,
        scope: &Scope,
        owner: CardOwner,
        month: YearMonth,
    ) -> AppResult<Timesheet> {
        let contract = get_contract(conn, scope.tenant_id, owner.contract_id)?;
        let policy = PolicyResolver::new(conn, scope.tenant_id)
            .resolve_month(&contract, month)?
            .require(|| format!("{} does not cover {}", contract.contract_number, month))?;

        let mut sheet = ensure_sheet(conn, scope.tenant_id, &owner, month)?;
        let cards = cards_of_month(conn, scope.tenant_id, &owner, month)?;
        let totals = compute_monthly(&cards, policy.overtime.as_ref(), month.days_in_month());

        update_totals(conn, scope.tenant_id, sheet.id, &totals)?;
        ttlog(
            conn,
            scope,
            "recompute",
            &format!("{owner} {month}"),
            &format!(
                "days={} work={} overtime={} premium={} deduction={} variable={}",
                totals.work_days,
                totals.work_minutes,
                totals.overtime_minutes,
                totals.premium_minutes,
                totals.deduction_minutes,
                totals.variable_minutes
            ),
        )?;
        debug!(%owner, %month, cards = cards.len(), "timesheet recomputed");

        sheet.totals = totals;
        Ok(sheet)
    }

    /// [`Self::recompute`] in its own transaction.
    pub fn recompute_month(
        pool: &mut DbPool,
        scope: &Scope,
        owner: CardOwner,
        month: YearMonth,
    ) -> AppResult<Timesheet> {
        pool.immediate(|conn| Self::recompute(conn, scope, owner, month))
    }

    pub fn find(
        conn: &Connection,
        scope: &Scope,
        owner: CardOwner,
        month: YearMonth,
    ) -> AppResult<Option<Timesheet>> {
        find_sheet(conn, scope.tenant_id, &owner, month)
    }

    /// Drop the Timesheet of `month` together with its Timecards.
    ///
    /// Only DRAFT and REJECTED sheets outside the period lock can go.
    /// Returns the number of Timecards removed.
    pub fn delete(
        pool: &mut DbPool,
        scope: &Scope,
        owner: CardOwner,
        month: YearMonth,
    ) -> AppResult<usize> {
        pool.immediate(|conn| {
            let sheet = find_sheet(conn, scope.tenant_id, &owner, month)?
                .ok_or_else(|| AppError::NotFound(format!("timesheet {owner} {month}")))?;
            if !sheet.status.is_editable() {
                return Err(AppError::LockedPeriod(format!(
                    "timesheet {owner} {month} is {}",
                    sheet.status.as_str()
                )));
            }
            for day in month.first_day().iter_days().take_while(|d| *d <= month.last_day()) {
                ApprovalLogic::ensure_unlocked(conn, scope, owner.staff_id, day)?;
            }

            let removed = delete_cards_of_month(conn, scope.tenant_id, &owner, month)?;
            delete_sheet(conn, scope.tenant_id, sheet.id)?;
            ttlog(
                conn,
                scope,
                "timesheet_delete",
                &format!("{owner} {month}"),
                &format!("timecards={removed}"),
            )?;
            info!(%owner, %month, removed, "timesheet deleted");
            Ok(removed)
        })
    }

    /// Move a Timesheet through DRAFT → SUBMITTED → APPROVED/REJECTED.
    ///
    /// Submitting recomputes the totals first so the frozen numbers are
    /// current.
    pub fn transition(
        pool: &mut DbPool,
        scope: &Scope,
        owner: CardOwner,
        month: YearMonth,
        transition: SheetTransition,
        now: Timestamp,
    ) -> AppResult<Timesheet> {
        pool.immediate(|conn| {
            let mut sheet = if transition == SheetTransition::Submit {
                Self::recompute(conn, scope, owner, month)?
            } else {
                find_sheet(conn, scope.tenant_id, &owner, month)?
                    .ok_or_else(|| AppError::NotFound(format!("timesheet {owner} {month}")))?
            };

            let actor = scope.actor.to_string();
            match (&transition, sheet.status) {
                (SheetTransition::Submit, s) if s.is_editable() => {
                    sheet.status = ApprovalStatus::Submitted;
                    sheet.submitted_at = Some(now);
                    sheet.submitted_by = Some(actor);
                }
                (SheetTransition::Withdraw, ApprovalStatus::Submitted) => {
                    sheet.status = ApprovalStatus::Draft;
                }
                (SheetTransition::Approve, ApprovalStatus::Submitted) => {
                    sheet.status = ApprovalStatus::Approved;
                    sheet.approved_at = Some(now);
                    sheet.approved_by = Some(actor);
                }
                (SheetTransition::Reject { reason }, ApprovalStatus::Submitted) => {
                    sheet.status = ApprovalStatus::Rejected;
                    sheet.rejected_at = Some(now);
                    sheet.rejected_by = Some(actor);
                    sheet.rejection_reason = Some(reason.clone());
                }
                (t, s) => {
                    return Err(AppError::InvalidState(format!(
                        "cannot {} a {} timesheet",
                        t.name(),
                        s.as_str()
                    )));
                }
            }

            update_status(conn, scope.tenant_id, &sheet)?;
            ttlog(
                conn,
                scope,
                &format!("timesheet_{}", transition.name()),
                &format!("{owner} {month}"),
                sheet.status.as_str(),
            )?;
            info!(%owner, %month, status = sheet.status.as_str(), "timesheet status changed");
            Ok(sheet)
        })
    }
}
