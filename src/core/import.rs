//! CSV import of daily Timecards.
//!
//! Column order: `employee_no, contract_no, work_date, work_type,
//! pattern_name, start_time, start_next_day, end_time, end_next_day,
//! break_minutes, paid_leave_days, memo`. The first line is a header.
//!
//! Each valid row is written in its own transaction without touching the
//! monthly totals; every affected month is recomputed once at the end.
//! Invalid rows are skipped and reported with their line number.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use encoding_rs::{Encoding, SHIFT_JIS, UTF_8};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::timecard::TimecardLogic;
use crate::core::timesheet::TimesheetLogic;
use crate::db::import_tasks::{get_task, insert_task, load_status, set_status, update_task};
use crate::db::log::ttlog;
use crate::db::master::{find_contract_by_number, find_staff_by_employee_no};
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult, ErrorKind};
use crate::models::{
    CardOwner, ContractKind, ImportTask, RowError, Scope, TaskStatus, Timecard, Timestamp,
    WorkType, YearMonth,
};
use crate::utils::date::parse_date;
use crate::utils::time::parse_time;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ImportEncoding {
    #[default]
    #[serde(rename = "cp932")]
    Cp932,
    #[serde(rename = "utf-8")]
    Utf8,
}

impl ImportEncoding {
    fn encoding(&self) -> &'static Encoding {
        match self {
            // WHATWG Shift_JIS is the Windows-31J/CP932 superset
            ImportEncoding::Cp932 => SHIFT_JIS,
            ImportEncoding::Utf8 => UTF_8,
        }
    }
}

impl FromStr for ImportEncoding {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cp932" | "shift_jis" | "sjis" | "windows-31j" => Ok(ImportEncoding::Cp932),
            "utf-8" | "utf8" => Ok(ImportEncoding::Utf8),
            other => Err(AppError::Config(format!("unknown import encoding '{other}'"))),
        }
    }
}

/// One syntactically valid CSV line. References (employee, contract) are
/// resolved when the row is written.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRow {
    pub line: usize,
    pub employee_no: String,
    pub contract_no: String,
    pub work_date: NaiveDate,
    pub work_type: WorkType,
    pub pattern_name: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub start_next_day: bool,
    pub end_time: Option<NaiveTime>,
    pub end_next_day: bool,
    pub break_minutes: i64,
    pub paid_leave_days: Decimal,
    pub memo: Option<String>,
}

fn row_error(line: usize, kind: ErrorKind, message: impl Into<String>) -> RowError {
    RowError {
        line,
        kind,
        message: message.into(),
    }
}

fn field(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

impl ImportRow {
    pub fn parse(line: usize, record: &StringRecord) -> Result<Self, RowError> {
        let bad = |msg: String| row_error(line, ErrorKind::ConstraintViolated, msg);

        let employee_no = field(record, 0)
            .ok_or_else(|| row_error(line, ErrorKind::NotFound, "employee number is missing"))?;
        let contract_no = field(record, 1)
            .ok_or_else(|| row_error(line, ErrorKind::NotFound, "contract number is missing"))?;

        let raw_date = field(record, 2).ok_or_else(|| bad("work date is missing".into()))?;
        let work_date =
            parse_date(raw_date).ok_or_else(|| bad(format!("invalid work date '{raw_date}'")))?;

        let work_type = match field(record, 3) {
            None => WorkType::Work,
            Some(raw) => raw
                .parse::<i64>()
                .ok()
                .and_then(WorkType::from_code)
                .ok_or_else(|| bad(format!("invalid work type '{raw}'")))?,
        };

        let time = |idx: usize, name: &str| -> Result<Option<NaiveTime>, RowError> {
            field(record, idx)
                .map(|raw| parse_time(raw).ok_or_else(|| bad(format!("invalid {name} '{raw}'"))))
                .transpose()
        };
        let flag = |idx: usize, name: &str| -> Result<bool, RowError> {
            match field(record, idx) {
                None | Some("0") => Ok(false),
                Some("1") => Ok(true),
                Some(raw) => Err(bad(format!("invalid {name} '{raw}', expected 0 or 1"))),
            }
        };

        let break_minutes = match field(record, 9) {
            None => 0,
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| bad(format!("invalid break minutes '{raw}'")))?,
        };
        let paid_leave_days = match field(record, 10) {
            None => Decimal::ZERO,
            Some(raw) => Decimal::from_str(raw)
                .map_err(|_| bad(format!("invalid paid leave days '{raw}'")))?,
        };

        Ok(Self {
            line,
            employee_no: employee_no.to_string(),
            contract_no: contract_no.to_string(),
            work_date,
            work_type,
            pattern_name: field(record, 4).map(str::to_string),
            start_time: time(5, "start time")?,
            start_next_day: flag(6, "start next-day flag")?,
            end_time: time(7, "end time")?,
            end_next_day: flag(8, "end next-day flag")?,
            break_minutes,
            paid_leave_days,
            memo: field(record, 11).map(str::to_string),
        })
    }
}

/// Decode and split a file into rows; syntax errors become row errors.
pub fn parse_csv(bytes: &[u8], encoding: ImportEncoding) -> Vec<Result<ImportRow, RowError>> {
    let (text, _, had_errors) = encoding.encoding().decode(bytes);
    if had_errors {
        warn!(?encoding, "import file contains undecodable bytes");
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    reader
        .records()
        .enumerate()
        .map(|(idx, rec)| match rec {
            Ok(record) => {
                let line = record
                    .position()
                    .map_or(idx + 2, |p| p.line() as usize);
                ImportRow::parse(line, &record)
            }
            Err(e) => {
                let line = e.position().map_or(idx + 2, |p| p.line() as usize);
                Err(row_error(line, ErrorKind::ConstraintViolated, e.to_string()))
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub imported_count: usize,
    pub errors: Vec<RowError>,
    pub cancelled: bool,
}

pub struct ImportLogic;

impl ImportLogic {
    /// Register a file for import and return the task id.
    pub fn upload(pool: &mut DbPool, scope: &Scope, path: &Path, now: Timestamp) -> AppResult<String> {
        if !path.is_file() {
            return Err(AppError::NotFound(format!("import file {}", path.display())));
        }
        let task = ImportTask {
            id: Uuid::new_v4().to_string(),
            file_path: path.display().to_string(),
            status: TaskStatus::Uploaded,
            progress: 0,
            total: 0,
            imported_count: 0,
            errors: Vec::new(),
            start_time: None,
            elapsed_seconds: 0.0,
            eta_seconds: None,
        };
        pool.immediate(|conn| {
            insert_task(conn, scope.tenant_id, &task)?;
            ttlog(conn, scope, "import_upload", &format!("task:{}", task.id), &task.file_path)
        })?;
        info!(task = %task.id, file = %task.file_path, "import uploaded");
        Ok(task.id)
    }

    pub fn progress(conn: &Connection, scope: &Scope, task_id: &str) -> AppResult<ImportTask> {
        get_task(conn, scope.tenant_id, task_id)
    }

    /// Request cancellation; the processing loop stops before its next row.
    pub fn cancel(pool: &mut DbPool, scope: &Scope, task_id: &str) -> AppResult<()> {
        pool.immediate(|conn| {
            let task = get_task(conn, scope.tenant_id, task_id)?;
            if task.status.is_terminal() {
                return Err(AppError::InvalidState(format!(
                    "import task {task_id} is already {}",
                    task.status.to_db_str()
                )));
            }
            set_status(conn, scope.tenant_id, task_id, TaskStatus::Cancelled)?;
            ttlog(conn, scope, "import_cancel", &format!("task:{task_id}"), "cancelled")
        })?;
        info!(task = task_id, "import cancellation requested");
        Ok(())
    }

    /// Run an uploaded task to completion (or cancellation).
    ///
    /// `clock` is sampled for the elapsed time and the ETA after each row.
    pub fn process(
        pool: &mut DbPool,
        scope: &Scope,
        task_id: &str,
        encoding: ImportEncoding,
        clock: &dyn Fn() -> Timestamp,
    ) -> AppResult<ImportTask> {
        let mut task = get_task(&pool.conn, scope.tenant_id, task_id)?;
        if task.status != TaskStatus::Uploaded {
            return Err(AppError::InvalidState(format!(
                "import task {task_id} is {}",
                task.status.to_db_str()
            )));
        }

        let started = clock();
        task.status = TaskStatus::Processing;
        task.start_time = Some(started);
        pool.immediate(|conn| update_task(conn, scope.tenant_id, &task))?;

        let bytes = match fs::read(&task.file_path) {
            Ok(b) => b,
            Err(e) => {
                task.status = TaskStatus::Failed;
                pool.immediate(|conn| update_task(conn, scope.tenant_id, &task))?;
                return Err(e.into());
            }
        };
        let rows = parse_csv(&bytes, encoding);
        task.total = rows.len() as i64;

        let summary = Self::run_rows(pool, scope, rows, |pool, summary, processed| {
            task.progress = processed as i64;
            task.imported_count = summary.imported_count as i64;
            task.errors = summary.errors.clone();
            task.elapsed_seconds = (clock() - started).num_milliseconds() as f64 / 1000.0;
            task.eta_seconds =
                ImportTask::estimate_eta(task.elapsed_seconds, task.progress, task.total);
            pool.immediate(|conn| update_task(conn, scope.tenant_id, &task))?;
            let status = load_status(&pool.conn, scope.tenant_id, task_id)?;
            Ok(status != TaskStatus::Cancelled)
        });

        let summary = match summary {
            Ok(s) => s,
            Err(e) => {
                task.status = TaskStatus::Failed;
                pool.immediate(|conn| update_task(conn, scope.tenant_id, &task))?;
                return Err(e);
            }
        };

        task.status = if summary.cancelled {
            TaskStatus::Cancelled
        } else {
            TaskStatus::Completed
        };
        task.imported_count = summary.imported_count as i64;
        task.errors = summary.errors.clone();
        task.elapsed_seconds = (clock() - started).num_milliseconds() as f64 / 1000.0;
        task.eta_seconds = Some(0.0);
        pool.immediate(|conn| {
            update_task(conn, scope.tenant_id, &task)?;
            ttlog(
                conn,
                scope,
                "import_complete",
                &format!("task:{task_id}"),
                &format!(
                    "status={} imported={} errors={}",
                    task.status.to_db_str(),
                    task.imported_count,
                    task.errors.len()
                ),
            )
        })?;
        info!(
            task = task_id,
            imported = task.imported_count,
            errors = task.errors.len(),
            "import finished"
        );

        get_task(&pool.conn, scope.tenant_id, task_id)
    }

    /// Synchronous core: write every valid row, collect the errors,
    /// recompute touched months once.
    pub fn import_rows<I>(pool: &mut DbPool, scope: &Scope, rows: I) -> AppResult<ImportSummary>
    where
        I: IntoIterator<Item = Result<ImportRow, RowError>>,
    {
        Self::run_rows(pool, scope, rows, |_, _, _| Ok(true))
    }

    fn run_rows<I, F>(
        pool: &mut DbPool,
        scope: &Scope,
        rows: I,
        mut after_row: F,
    ) -> AppResult<ImportSummary>
    where
        I: IntoIterator<Item = Result<ImportRow, RowError>>,
        F: FnMut(&mut DbPool, &ImportSummary, usize) -> AppResult<bool>,
    {
        let mut summary = ImportSummary::default();
        let mut touched: BTreeSet<(CardOwner, YearMonth)> = BTreeSet::new();

        for (idx, row) in rows.into_iter().enumerate() {
            match row {
                Err(e) => summary.errors.push(e),
                Ok(row) => match pool.immediate(|conn| write_row(conn, scope, &row)) {
                    Ok(key) => {
                        touched.insert(key);
                        summary.imported_count += 1;
                    }
                    Err(e) if e.kind() != ErrorKind::Infrastructure => {
                        summary.errors.push(row_error(row.line, e.kind(), e.to_string()));
                    }
                    Err(e) => return Err(e),
                },
            }

            if !after_row(pool, &summary, idx + 1)? {
                summary.cancelled = true;
                warn!(processed = idx + 1, "import cancelled");
                break;
            }
        }

        for (owner, month) in touched {
            pool.immediate(|conn| TimesheetLogic::recompute(conn, scope, owner, month))?;
        }

        Ok(summary)
    }
}

/// Resolve references and store one row as a staff-side Timecard.
fn write_row(conn: &Connection, scope: &Scope, row: &ImportRow) -> AppResult<(CardOwner, YearMonth)> {
    let staff = find_staff_by_employee_no(conn, scope.tenant_id, &row.employee_no)?
        .ok_or_else(|| AppError::NotFound(format!("employee number {}", row.employee_no)))?;
    let contract = find_contract_by_number(conn, scope.tenant_id, &row.contract_no)?
        .filter(|c| c.kind == ContractKind::Staff)
        .ok_or_else(|| AppError::NotFound(format!("contract number {}", row.contract_no)))?;
    if contract.staff_id != Some(staff.id) {
        return Err(AppError::NotFound(format!(
            "contract {} of employee {}",
            row.contract_no, row.employee_no
        )));
    }
    if !contract.covers(row.work_date) {
        return Err(AppError::OutOfPeriod(format!(
            "{} is outside contract {}",
            row.work_date.format("%Y-%m-%d"),
            row.contract_no
        )));
    }

    let owner = CardOwner::staff(contract.id, staff.id);
    let mut card = Timecard::new(owner, row.work_date, row.work_type);
    card.work_time_slot = row.pattern_name.clone();
    card.start_time = row.start_time;
    card.start_time_next_day = row.start_next_day;
    card.end_time = row.end_time;
    card.end_time_next_day = row.end_next_day;
    card.break_minutes = row.break_minutes;
    card.paid_leave_days = row.paid_leave_days;
    card.memo = row.memo.clone();

    TimecardLogic::save_in(conn, scope, card, true)?;
    Ok((owner, YearMonth::from_date(row.work_date)))
}
