//! Policy resolution: which punch config, work-time pattern and overtime
//! pattern apply to a contract on a date.

use std::collections::HashMap;

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::db::master::{find_overtime_pattern, find_time_punch_config, find_work_time_pattern};
use crate::errors::{AppError, AppResult};
use crate::models::{Contract, OvertimePattern, TimePunchConfig, WorkTimePattern, YearMonth};

#[derive(Debug, Clone, Default)]
pub struct ResolvedPolicy {
    pub time_punch: Option<TimePunchConfig>,
    pub work_time: Option<WorkTimePattern>,
    pub overtime: Option<OvertimePattern>,
}

/// Outcome of a resolution. A contract not covering the date is a value,
/// not an error; callers decide how to surface it.
#[derive(Debug, Clone)]
pub enum Resolution {
    Covered(ResolvedPolicy),
    OutOfPeriod,
}

impl Resolution {
    /// Turn `OutOfPeriod` into the matching error.
    pub fn require(self, what: impl FnOnce() -> String) -> AppResult<ResolvedPolicy> {
        match self {
            Resolution::Covered(p) => Ok(p),
            Resolution::OutOfPeriod => Err(AppError::OutOfPeriod(what())),
        }
    }
}

/// Request-scoped resolver. Patterns are cached by id for the lifetime of
/// the resolver only, so edits to master data are seen by the next request.
pub struct PolicyResolver<'c> {
    conn: &'c Connection,
    tenant_id: i64,
    time_punch: HashMap<i64, Option<TimePunchConfig>>,
    work_time: HashMap<i64, Option<WorkTimePattern>>,
    overtime: HashMap<i64, Option<OvertimePattern>>,
}

impl<'c> PolicyResolver<'c> {
    pub fn new(conn: &'c Connection, tenant_id: i64) -> Self {
        Self {
            conn,
            tenant_id,
            time_punch: HashMap::new(),
            work_time: HashMap::new(),
            overtime: HashMap::new(),
        }
    }

    /// Policy of `contract` on `date` (`start <= date <= end`).
    pub fn resolve(&mut self, contract: &Contract, date: NaiveDate) -> AppResult<Resolution> {
        if !contract.covers(date) {
            return Ok(Resolution::OutOfPeriod);
        }
        Ok(Resolution::Covered(self.load(contract)?))
    }

    /// Policy of `contract` for a month; any overlap counts as coverage.
    pub fn resolve_month(&mut self, contract: &Contract, month: YearMonth) -> AppResult<Resolution> {
        if contract.overlap(month).is_none() {
            return Ok(Resolution::OutOfPeriod);
        }
        Ok(Resolution::Covered(self.load(contract)?))
    }

    /// `resolve` with `OutOfPeriod` surfaced as an error.
    pub fn resolve_covered(
        &mut self,
        contract: &Contract,
        date: NaiveDate,
    ) -> AppResult<ResolvedPolicy> {
        self.resolve(contract, date)?.require(|| {
            format!(
                "{} does not cover {}",
                contract.contract_number,
                date.format("%Y-%m-%d")
            )
        })
    }

    fn load(&mut self, contract: &Contract) -> AppResult<ResolvedPolicy> {
        let (conn, tenant) = (self.conn, self.tenant_id);

        let time_punch = match contract.time_punch_id {
            Some(id) => cached(&mut self.time_punch, id, || {
                find_time_punch_config(conn, tenant, id)
            })?,
            None => None,
        };
        let work_time = match contract.work_time_pattern_id {
            Some(id) => cached(&mut self.work_time, id, || {
                find_work_time_pattern(conn, tenant, id)
            })?,
            None => None,
        };
        let overtime = match contract.overtime_pattern_id {
            Some(id) => cached(&mut self.overtime, id, || {
                find_overtime_pattern(conn, tenant, id)
            })?,
            None => None,
        };

        Ok(ResolvedPolicy {
            time_punch,
            work_time,
            overtime,
        })
    }
}

fn cached<T: Clone>(
    cache: &mut HashMap<i64, Option<T>>,
    id: i64,
    fetch: impl FnOnce() -> AppResult<Option<T>>,
) -> AppResult<Option<T>> {
    if let Some(hit) = cache.get(&id) {
        return Ok(hit.clone());
    }
    let value = fetch()?;
    cache.insert(id, value.clone());
    Ok(value)
}
