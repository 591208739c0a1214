//! Live punch state machine of one staff member.
//!
//! States are derived from the surfaced Timerecord, never stored:
//! no record → not started; open record with an open break → on break;
//! open record → working; closed record → finished.

use chrono::Duration;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::approval::ApprovalLogic;
use crate::core::geocode::{Geocoder, NoopGeocoder};
use crate::core::policy::{PolicyResolver, Resolution};
use crate::core::rounding::{PunchKind, round_punch};
use crate::db::log::ttlog;
use crate::db::master::{get_contract, staff_contracts_of};
use crate::db::pool::DbPool;
use crate::db::timerecords::{
    AddressSlot, delete_break, delete_record, find_record, find_record_for_day, insert_break,
    insert_record, records_of_staff_on, set_address, update_break, update_record,
};
use crate::errors::{AppError, AppResult};
use crate::models::{
    Contract, Location, PunchMethod, Scope, TimePunchConfig, Timerecord, TimerecordBreak,
    Timestamp,
};

pub const DEFAULT_CANCEL_WINDOW_SECONDS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PunchState {
    NotStarted,
    Working,
    OnBreak,
    Finished,
}

impl PunchState {
    pub fn of(record: Option<&Timerecord>) -> Self {
        match record {
            None => PunchState::NotStarted,
            Some(r) if !r.is_open() => PunchState::Finished,
            Some(r) if r.open_break().is_some() => PunchState::OnBreak,
            Some(_) => PunchState::Working,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PunchState::NotStarted => "not started",
            PunchState::Working => "working",
            PunchState::OnBreak => "on break",
            PunchState::Finished => "finished",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PunchEvent {
    Start,
    BreakStart,
    BreakEnd,
    End,
    Cancel,
}

impl PunchEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            PunchEvent::Start => "start",
            PunchEvent::BreakStart => "break_start",
            PunchEvent::BreakEnd => "break_end",
            PunchEvent::End => "end",
            PunchEvent::Cancel => "cancel",
        }
    }
}

/// The most recent mutation on a record, as undone by `cancel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastEvent {
    Start,
    BreakStart { break_id: i64 },
    BreakEnd { break_id: i64 },
    End,
}

impl LastEvent {
    /// Tie-break when two punches share a timestamp.
    fn rank(&self) -> u8 {
        match self {
            LastEvent::Start => 0,
            LastEvent::BreakStart { .. } => 1,
            LastEvent::BreakEnd { .. } => 2,
            LastEvent::End => 3,
        }
    }
}

/// Latest raw punch of a record.
pub fn latest_event(record: &Timerecord) -> (LastEvent, Timestamp) {
    let mut events = vec![(LastEvent::Start, record.start_time)];
    for b in &record.breaks {
        events.push((LastEvent::BreakStart { break_id: b.id }, b.break_start));
        if let Some(end) = b.break_end {
            events.push((LastEvent::BreakEnd { break_id: b.id }, end));
        }
    }
    if let Some(end) = record.end_time {
        events.push((LastEvent::End, end));
    }
    events
        .into_iter()
        .max_by_key(|(ev, at)| (*at, ev.rank()))
        .unwrap_or((LastEvent::Start, record.start_time))
}

pub struct PunchOptions<'g> {
    pub cancel_window_seconds: i64,
    pub geocoder: &'g dyn Geocoder,
}

impl Default for PunchOptions<'static> {
    fn default() -> Self {
        Self {
            cancel_window_seconds: DEFAULT_CANCEL_WINDOW_SECONDS,
            geocoder: &NoopGeocoder,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PunchStatus {
    pub state: PunchState,
    pub contract: Option<Contract>,
    pub record: Option<Timerecord>,
}

#[derive(Debug, Clone)]
pub struct PunchOutcome {
    pub event: PunchEvent,
    pub state: PunchState,
    pub record: Option<Timerecord>,
    /// Set for `cancel`: what was undone.
    pub undone: Option<LastEvent>,
}

/// Address lookup to run once the punch is committed.
struct PendingAddress {
    slot: AddressSlot,
    row_id: i64,
    location: Location,
}

pub struct PunchLogic;

impl PunchLogic {
    /// Current state without mutating anything.
    pub fn state(
        conn: &Connection,
        scope: &Scope,
        staff_id: i64,
        now: Timestamp,
    ) -> AppResult<PunchStatus> {
        let (contract, record) = surface(conn, scope, staff_id, now, None)?;
        Ok(PunchStatus {
            state: PunchState::of(record.as_ref()),
            contract,
            record,
        })
    }

    /// Apply one event at `now`.
    ///
    /// The transition runs in one IMMEDIATE transaction, which serialises
    /// concurrent punches of the same staff member. The address of a stored
    /// location is looked up afterwards.
    pub fn apply(
        pool: &mut DbPool,
        scope: &Scope,
        staff_id: i64,
        event: PunchEvent,
        now: Timestamp,
        location: Option<Location>,
        opts: &PunchOptions<'_>,
    ) -> AppResult<PunchOutcome> {
        let (mut outcome, pending) = pool.immediate(|conn| {
            apply_in(
                conn,
                scope,
                staff_id,
                event,
                now,
                location,
                opts.cancel_window_seconds,
            )
        })?;

        if let Some(mut p) = pending {
            p.location.address = opts.geocoder.fetch_address(p.location.lat, p.location.lon);
            if p.location.address.is_some() {
                pool.immediate(|conn| {
                    set_address(conn, scope.tenant_id, p.slot, p.row_id, &p.location)
                })?;
                if let Some(rec) = &outcome.record {
                    outcome.record = find_record(&pool.conn, scope.tenant_id, rec.id)?;
                }
            }
        }

        Ok(outcome)
    }
}

/// Record the engine acts on: yesterday's still-open record if any,
/// otherwise today's record of the contract covering today.
///
/// With `cancel_window` set and nothing punched today, yesterday's record
/// whose latest punch is still inside the window surfaces too, so an end
/// made around midnight can be cancelled.
fn surface(
    conn: &Connection,
    scope: &Scope,
    staff_id: i64,
    now: Timestamp,
    cancel_window: Option<i64>,
) -> AppResult<(Option<Contract>, Option<Timerecord>)> {
    let today = now.date_naive();
    let yesterday_records = match today.pred_opt() {
        Some(yesterday) => records_of_staff_on(conn, scope.tenant_id, staff_id, yesterday)?,
        None => Vec::new(),
    };
    if let Some(open) = yesterday_records.iter().find(|r| r.is_open()) {
        let contract = get_contract(conn, scope.tenant_id, open.staff_contract_id)?;
        return Ok((Some(contract), Some(open.clone())));
    }

    // newest start_date wins when several contracts overlap
    let contract = staff_contracts_of(conn, scope.tenant_id, staff_id)?
        .into_iter()
        .find(|c| c.covers(today));
    let record = match &contract {
        Some(c) => find_record_for_day(conn, scope.tenant_id, c.id, today)?,
        None => None,
    };

    if record.is_none()
        && let Some(window) = cancel_window
        && let Some(recent) = yesterday_records
            .into_iter()
            .filter(|r| {
                let (_, at) = latest_event(r);
                at <= now && now - at < Duration::seconds(window)
            })
            .max_by_key(|r| latest_event(r).1)
    {
        let contract = get_contract(conn, scope.tenant_id, recent.staff_contract_id)?;
        return Ok((Some(contract), Some(recent)));
    }
    Ok((contract, record))
}

fn keep_location(cfg: Option<&TimePunchConfig>, location: Option<Location>) -> Option<Location> {
    if cfg.is_some_and(|c| c.location_info) {
        location.map(|l| Location { address: None, ..l })
    } else {
        None
    }
}

fn invalid(state: PunchState, event: PunchEvent) -> AppError {
    AppError::InvalidState(format!("cannot {} while {}", event.as_str(), state.as_str()))
}

fn apply_in(
    conn: &Connection,
    scope: &Scope,
    staff_id: i64,
    event: PunchEvent,
    now: Timestamp,
    location: Option<Location>,
    cancel_window_seconds: i64,
) -> AppResult<(PunchOutcome, Option<PendingAddress>)> {
    let today = now.date_naive();
    let cancel_window = (event == PunchEvent::Cancel).then_some(cancel_window_seconds);
    let (contract, record) = surface(conn, scope, staff_id, now, cancel_window)?;
    let contract = contract.ok_or_else(|| {
        AppError::OutOfPeriod(format!(
            "staff {staff_id} has no contract covering {}",
            today.format("%Y-%m-%d")
        ))
    })?;
    let state = PunchState::of(record.as_ref());
    let mut resolver = PolicyResolver::new(conn, scope.tenant_id);
    let mut pending = None;
    let mut undone = None;

    let record_id = match (event, record) {
        (PunchEvent::Start, None) => {
            if !contract.is_confirmed() {
                return Err(AppError::InvalidState(format!(
                    "contract {} is not confirmed",
                    contract.contract_number
                )));
            }
            let policy = resolver.resolve_covered(&contract, today)?;
            let cfg = policy.time_punch.ok_or_else(|| {
                AppError::InvalidState(format!(
                    "contract {} has no time punch config",
                    contract.contract_number
                ))
            })?;
            if cfg.punch_method != PunchMethod::Punch {
                return Err(AppError::InvalidState(format!(
                    "contract {} does not use live punching",
                    contract.contract_number
                )));
            }
            ApprovalLogic::ensure_unlocked(conn, scope, staff_id, today)?;

            let start_location = keep_location(Some(&cfg), location);
            let rec = Timerecord {
                id: 0,
                staff_id,
                staff_contract_id: contract.id,
                work_date: today,
                start_time: now,
                end_time: None,
                rounded_start_time: round_punch(Some(&cfg), PunchKind::Start, now),
                rounded_end_time: None,
                start_location: start_location.clone(),
                end_location: None,
                memo: None,
                breaks: Vec::new(),
            };
            let id = insert_record(conn, scope.tenant_id, &rec)?;
            if let Some(location) = start_location {
                pending = Some(PendingAddress {
                    slot: AddressSlot::RecordStart,
                    row_id: id,
                    location,
                });
            }
            Some(id)
        }
        (PunchEvent::Start, Some(_)) => return Err(invalid(state, event)),
        (_, None) => return Err(invalid(state, event)),
        (event, Some(mut rec)) => {
            ApprovalLogic::ensure_unlocked(conn, scope, staff_id, rec.work_date)?;
            let cfg = match resolver.resolve(&contract, rec.work_date)? {
                Resolution::Covered(p) => p.time_punch,
                Resolution::OutOfPeriod => None,
            };
            let (last, last_at) = latest_event(&rec);

            if event != PunchEvent::Cancel && now < last_at {
                return Err(AppError::ConstraintViolated(format!(
                    "punch at {} is earlier than the previous one at {}",
                    now.to_rfc3339(),
                    last_at.to_rfc3339()
                )));
            }

            match (event, state) {
                (PunchEvent::BreakStart, PunchState::Working) => {
                    let loc = keep_location(cfg.as_ref(), location);
                    let b = TimerecordBreak {
                        id: 0,
                        timerecord_id: rec.id,
                        break_start: now,
                        break_end: None,
                        rounded_break_start: round_punch(cfg.as_ref(), PunchKind::BreakStart, now),
                        rounded_break_end: None,
                        start_location: loc.clone(),
                        end_location: None,
                    };
                    let break_id = insert_break(conn, scope.tenant_id, &b)?;
                    if let Some(location) = loc {
                        pending = Some(PendingAddress {
                            slot: AddressSlot::BreakStart,
                            row_id: break_id,
                            location,
                        });
                    }
                }
                (PunchEvent::BreakEnd, PunchState::OnBreak) => {
                    let mut b = rec
                        .open_break()
                        .cloned()
                        .ok_or_else(|| invalid(state, event))?;
                    if now <= b.break_start {
                        return Err(AppError::ConstraintViolated(
                            "break must end after it starts".into(),
                        ));
                    }
                    let loc = keep_location(cfg.as_ref(), location);
                    b.break_end = Some(now);
                    b.rounded_break_end = Some(round_punch(cfg.as_ref(), PunchKind::BreakEnd, now));
                    b.end_location = loc.clone();
                    update_break(conn, scope.tenant_id, &b)?;
                    if let Some(location) = loc {
                        pending = Some(PendingAddress {
                            slot: AddressSlot::BreakEnd,
                            row_id: b.id,
                            location,
                        });
                    }
                }
                (PunchEvent::End, PunchState::Working) => {
                    let loc = keep_location(cfg.as_ref(), location);
                    rec.end_time = Some(now);
                    rec.rounded_end_time = Some(round_punch(cfg.as_ref(), PunchKind::End, now));
                    rec.end_location = loc.clone();
                    update_record(conn, scope.tenant_id, &rec)?;
                    if let Some(location) = loc {
                        pending = Some(PendingAddress {
                            slot: AddressSlot::RecordEnd,
                            row_id: rec.id,
                            location,
                        });
                    }
                }
                (PunchEvent::Cancel, _) => {
                    if now - last_at >= Duration::seconds(cancel_window_seconds) {
                        return Err(AppError::InvalidState(format!(
                            "last punch at {} is older than {} seconds",
                            last_at.to_rfc3339(),
                            cancel_window_seconds
                        )));
                    }
                    undo(conn, scope, &mut rec, last)?;
                    undone = Some(last);
                }
                _ => return Err(invalid(state, event)),
            }
            Some(rec.id)
        }
    };

    let record = match record_id {
        Some(id) => find_record(conn, scope.tenant_id, id)?,
        None => None,
    };
    let new_state = PunchState::of(record.as_ref());
    let work_date = record.as_ref().map_or(today, |r| r.work_date);

    ttlog(
        conn,
        scope,
        &format!("punch_{}", event.as_str()),
        &format!("staff:{staff_id} {}", work_date.format("%Y-%m-%d")),
        &format!("{} -> {} at {}", state.as_str(), new_state.as_str(), now.to_rfc3339()),
    )?;
    info!(
        staff_id,
        event = event.as_str(),
        from = state.as_str(),
        to = new_state.as_str(),
        "punch applied"
    );

    Ok((
        PunchOutcome {
            event,
            state: new_state,
            record,
            undone,
        },
        pending,
    ))
}

fn undo(conn: &Connection, scope: &Scope, rec: &mut Timerecord, last: LastEvent) -> AppResult<()> {
    match last {
        LastEvent::End => {
            rec.end_time = None;
            rec.rounded_end_time = None;
            rec.end_location = None;
            update_record(conn, scope.tenant_id, rec)?;
        }
        LastEvent::BreakEnd { break_id } => {
            let Some(b) = rec.breaks.iter_mut().find(|b| b.id == break_id) else {
                return Err(AppError::NotFound(format!("break {break_id}")));
            };
            b.break_end = None;
            b.rounded_break_end = None;
            b.end_location = None;
            update_break(conn, scope.tenant_id, b)?;
        }
        LastEvent::BreakStart { break_id } => {
            delete_break(conn, scope.tenant_id, break_id)?;
        }
        LastEvent::Start => {
            delete_record(conn, scope.tenant_id, rec.id)?;
        }
    }
    debug!(record = rec.id, ?last, "punch undone");
    Ok(())
}
