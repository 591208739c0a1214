//! Submission and approval of closing periods, and the period lock they hold.

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::info;

use crate::core::sync::{SyncLogic, SyncReport};
use crate::db::approvals::{
    approvals_for_closing, find_approval, find_by_key, has_locking_approval, insert_approval,
    update_approval,
};
use crate::db::log::ttlog;
use crate::db::master::staff_contracts_of;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::{Approval, ApprovalStatus, Scope, Timestamp, YearMonth};

pub struct ApprovalLogic;

impl ApprovalLogic {
    /// A date is locked while a SUBMITTED or APPROVED approval of the staff
    /// member covers it.
    pub fn is_locked(
        conn: &Connection,
        scope: &Scope,
        staff_id: i64,
        date: NaiveDate,
    ) -> AppResult<bool> {
        has_locking_approval(conn, scope.tenant_id, staff_id, date)
    }

    pub fn ensure_unlocked(
        conn: &Connection,
        scope: &Scope,
        staff_id: i64,
        date: NaiveDate,
    ) -> AppResult<()> {
        if Self::is_locked(conn, scope, staff_id, date)? {
            return Err(AppError::LockedPeriod(format!(
                "staff {staff_id} on {} is under approval",
                date.format("%Y-%m-%d")
            )));
        }
        Ok(())
    }

    /// Submit every staff contract of `staff_id` overlapping `month`.
    ///
    /// New approvals are created SUBMITTED; DRAFT and REJECTED ones move to
    /// SUBMITTED; SUBMITTED and APPROVED ones are left as they are.
    pub fn submit(
        pool: &mut DbPool,
        scope: &Scope,
        staff_id: i64,
        month: YearMonth,
        now: Timestamp,
    ) -> AppResult<Vec<Approval>> {
        pool.immediate(|conn| {
            let contracts: Vec<_> = staff_contracts_of(conn, scope.tenant_id, staff_id)?
                .into_iter()
                .filter_map(|c| c.overlap(month).map(|period| (c, period)))
                .collect();
            if contracts.is_empty() {
                return Err(AppError::OutOfPeriod(format!(
                    "staff {staff_id} has no contract in {month}"
                )));
            }

            let closing_date = month.last_day();
            let actor = scope.actor.to_string();
            let mut out = Vec::new();

            for (contract, (period_start, period_end)) in contracts {
                let existing =
                    find_by_key(conn, scope.tenant_id, staff_id, contract.id, closing_date)?;

                let approval = match existing {
                    None => {
                        let mut a = Approval {
                            id: 0,
                            staff_id,
                            staff_contract_id: contract.id,
                            closing_date,
                            period_start,
                            period_end,
                            status: ApprovalStatus::Submitted,
                            submitted_at: Some(now),
                            submitted_by: Some(actor.clone()),
                            approved_at: None,
                            approved_by: None,
                            rejected_at: None,
                            rejected_by: None,
                            rejection_reason: None,
                        };
                        a.id = insert_approval(conn, scope.tenant_id, &a)?;
                        a
                    }
                    Some(a) if !a.status.is_editable() => a,
                    Some(mut a) => {
                        a.period_start = period_start;
                        a.period_end = period_end;
                        a.status = ApprovalStatus::Submitted;
                        a.submitted_at = Some(now);
                        a.submitted_by = Some(actor.clone());
                        update_approval(conn, scope.tenant_id, &a)?;
                        a
                    }
                };

                ttlog(
                    conn,
                    scope,
                    "approval_submit",
                    &format!("approval:{}", approval.id),
                    &format!(
                        "{} {}..{} {}",
                        contract.contract_number,
                        approval.period_start.format("%Y-%m-%d"),
                        approval.period_end.format("%Y-%m-%d"),
                        approval.status.as_str()
                    ),
                )?;
                out.push(approval);
            }

            info!(staff_id, %month, count = out.len(), "approvals submitted");
            Ok(out)
        })
    }

    /// SUBMITTED → DRAFT for every approval of the month.
    pub fn withdraw(
        pool: &mut DbPool,
        scope: &Scope,
        staff_id: i64,
        month: YearMonth,
    ) -> AppResult<Vec<Approval>> {
        pool.immediate(|conn| {
            let submitted: Vec<Approval> =
                approvals_for_closing(conn, scope.tenant_id, staff_id, month.last_day())?
                    .into_iter()
                    .filter(|a| a.status == ApprovalStatus::Submitted)
                    .collect();
            if submitted.is_empty() {
                return Err(AppError::InvalidState(format!(
                    "nothing submitted for staff {staff_id} in {month}"
                )));
            }

            let mut out = Vec::new();
            for mut a in submitted {
                a.status = ApprovalStatus::Draft;
                update_approval(conn, scope.tenant_id, &a)?;
                ttlog(
                    conn,
                    scope,
                    "approval_withdraw",
                    &format!("approval:{}", a.id),
                    "draft",
                )?;
                out.push(a);
            }
            info!(staff_id, %month, "approvals withdrawn");
            Ok(out)
        })
    }

    /// SUBMITTED → APPROVED, then materialize the Timecards in the same
    /// transaction.
    pub fn approve(
        pool: &mut DbPool,
        scope: &Scope,
        approval_id: i64,
        now: Timestamp,
    ) -> AppResult<(Approval, SyncReport)> {
        pool.immediate(|conn| {
            let mut a = load_submitted(conn, scope, approval_id, "approve")?;
            a.status = ApprovalStatus::Approved;
            a.approved_at = Some(now);
            a.approved_by = Some(scope.actor.to_string());
            update_approval(conn, scope.tenant_id, &a)?;

            let report = SyncLogic::sync_approval(conn, scope, &a)?;

            ttlog(
                conn,
                scope,
                "approval_approve",
                &format!("approval:{}", a.id),
                &format!(
                    "staff_cards={} client_cards={} skipped_open={}",
                    report.staff_cards, report.client_cards, report.skipped_open
                ),
            )?;
            info!(
                approval_id,
                staff_cards = report.staff_cards,
                client_cards = report.client_cards,
                "approval approved"
            );
            Ok((a, report))
        })
    }

    /// SUBMITTED → REJECTED with a reason; the period unlocks.
    pub fn reject(
        pool: &mut DbPool,
        scope: &Scope,
        approval_id: i64,
        reason: &str,
        now: Timestamp,
    ) -> AppResult<Approval> {
        pool.immediate(|conn| {
            let mut a = load_submitted(conn, scope, approval_id, "reject")?;
            a.status = ApprovalStatus::Rejected;
            a.rejected_at = Some(now);
            a.rejected_by = Some(scope.actor.to_string());
            a.rejection_reason = Some(reason.to_string());
            update_approval(conn, scope.tenant_id, &a)?;

            ttlog(
                conn,
                scope,
                "approval_reject",
                &format!("approval:{}", a.id),
                reason,
            )?;
            info!(approval_id, "approval rejected");
            Ok(a)
        })
    }

    pub fn list(
        conn: &Connection,
        scope: &Scope,
        staff_id: i64,
        month: YearMonth,
    ) -> AppResult<Vec<Approval>> {
        approvals_for_closing(conn, scope.tenant_id, staff_id, month.last_day())
    }
}

fn load_submitted(
    conn: &Connection,
    scope: &Scope,
    approval_id: i64,
    action: &str,
) -> AppResult<Approval> {
    let a = find_approval(conn, scope.tenant_id, approval_id)?
        .ok_or_else(|| AppError::NotFound(format!("approval {approval_id}")))?;
    if a.status != ApprovalStatus::Submitted {
        return Err(AppError::InvalidState(format!(
            "cannot {action} approval {approval_id}: it is {}",
            a.status.as_str()
        )));
    }
    Ok(a)
}
