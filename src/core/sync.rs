//! Approval fan-out: approved Timerecords become Timecards on the staff
//! side and on every client contract the staff was assigned to that day.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::core::calculator::late_night::late_night_minutes_of;
use crate::core::policy::PolicyResolver;
use crate::core::rounding::truncate_seconds;
use crate::core::timecard::TimecardLogic;
use crate::core::timesheet::TimesheetLogic;
use crate::db::master::{assignments_of, find_contract};
use crate::db::timerecords::records_in_range;
use crate::errors::AppResult;
use crate::models::{
    Approval, CardOwner, Scope, Timecard, Timerecord, Timestamp, WorkType, YearMonth,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub staff_cards: usize,
    pub client_cards: usize,
    pub skipped_open: usize,
}

pub struct SyncLogic;

impl SyncLogic {
    /// Materialize every closed Timerecord of the approval period.
    ///
    /// Each touched `(owner, month)` is recomputed exactly once at the end.
    pub fn sync_approval(
        conn: &Connection,
        scope: &Scope,
        approval: &Approval,
    ) -> AppResult<SyncReport> {
        let records = records_in_range(
            conn,
            scope.tenant_id,
            approval.staff_contract_id,
            approval.period_start,
            approval.period_end,
        )?;
        let assignments = assignments_of(conn, scope.tenant_id, approval.staff_contract_id)?;

        let mut resolver = PolicyResolver::new(conn, scope.tenant_id);
        let mut touched: BTreeSet<(CardOwner, YearMonth)> = BTreeSet::new();
        let mut report = SyncReport::default();

        for record in &records {
            let staff_owner = CardOwner::staff(record.staff_contract_id, record.staff_id);
            let Some(draft) = card_from_record(record, staff_owner) else {
                warn!(
                    record = record.id,
                    date = %record.work_date,
                    "open or empty timerecord skipped"
                );
                report.skipped_open += 1;
                continue;
            };
            let month = YearMonth::from_date(record.work_date);

            TimecardLogic::write_synced(conn, scope, &mut resolver, draft)?;
            touched.insert((staff_owner, month));
            report.staff_cards += 1;

            for a in assignments.iter().filter(|a| a.contains(record.work_date)) {
                let covered = find_contract(conn, scope.tenant_id, a.client_contract_id)?
                    .is_some_and(|c| c.covers(record.work_date));
                if !covered {
                    warn!(
                        assignment = a.id,
                        date = %record.work_date,
                        "client contract does not cover the day, skipped"
                    );
                    continue;
                }
                let owner = CardOwner::client(a.client_contract_id, record.staff_id);
                if let Some(draft) = card_from_record(record, owner) {
                    TimecardLogic::write_synced(conn, scope, &mut resolver, draft)?;
                    touched.insert((owner, month));
                    report.client_cards += 1;
                }
            }
        }

        for (owner, month) in touched {
            TimesheetLogic::recompute(conn, scope, owner, month)?;
        }

        debug!(approval = approval.id, ?report, "sync finished");
        Ok(report)
    }
}

fn naive_minute(ts: &Timestamp) -> NaiveDateTime {
    truncate_seconds(*ts).naive_local()
}

/// Build the day row for `owner` from a closed record.
///
/// Break time inside the late-night window is split into
/// `late_night_break_minutes`; the rest stays in `break_minutes`. Breaks are
/// cut to the rounded shift before counting. Returns
/// `None` for open records and records whose rounded span is empty.
pub fn card_from_record(record: &Timerecord, owner: CardOwner) -> Option<Timecard> {
    let start = naive_minute(&record.rounded_start_time);
    let end = naive_minute(&record.rounded_end_time.or(record.end_time)?);
    if end <= start {
        return None;
    }

    // rounded breaks are clamped to the rounded shift
    let closed_breaks: Vec<(NaiveDateTime, NaiveDateTime)> = record
        .breaks
        .iter()
        .filter_map(|b| {
            let b_end = naive_minute(&b.rounded_break_end?).min(end);
            let b_start = naive_minute(&b.rounded_break_start).max(start);
            (b_start < b_end).then_some((b_start, b_end))
        })
        .collect();
    let total_break: i64 = closed_breaks.iter().map(|(s, e)| (*e - *s).num_minutes()).sum();
    let late_night_break = late_night_minutes_of(closed_breaks);

    let mut card = Timecard::new(owner, record.work_date, WorkType::Work);
    card.start_time = Some(start.time());
    card.start_time_next_day = start.date() > record.work_date;
    card.end_time = Some(end.time());
    card.end_time_next_day = end.date() > record.work_date;
    card.break_minutes = (total_break - late_night_break).max(0);
    card.late_night_break_minutes = late_night_break.min(total_break);
    card.memo = record.memo.clone();
    Some(card)
}
