pub mod approval;
pub mod config;
pub mod import;
pub mod init;
pub mod log;
pub mod master;
pub mod punch;
pub mod timecard;

use chrono::{DateTime, Local};
use rusqlite::Connection;

use crate::config::Config;
use crate::db::master::get_contract;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::models::{CardOwner, ContractKind, Scope, Timestamp};

pub(crate) fn open_pool(cfg: &Config) -> AppResult<DbPool> {
    DbPool::open(&cfg.database)
}

/// `--at` value, or the local clock.
pub(crate) fn timestamp_or_now(at: Option<&str>) -> AppResult<Timestamp> {
    match at {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map_err(|_| AppError::InvalidDate(format!("expected RFC3339 timestamp, got '{raw}'"))),
        None => Ok(Local::now().fixed_offset()),
    }
}

/// Card owner of a contract; client contracts need the assigned staff id.
pub(crate) fn resolve_owner(
    conn: &Connection,
    scope: &Scope,
    contract_id: i64,
    staff: Option<i64>,
) -> AppResult<CardOwner> {
    let contract = get_contract(conn, scope.tenant_id, contract_id)?;
    match contract.kind {
        ContractKind::Staff => {
            let staff_id = staff.or(contract.staff_id).ok_or_else(|| {
                AppError::NotFound(format!("staff of contract {}", contract.contract_number))
            })?;
            Ok(CardOwner::staff(contract.id, staff_id))
        }
        ContractKind::Client => {
            let staff_id = staff.ok_or_else(|| {
                AppError::ConstraintViolated("--staff is required for client contracts".into())
            })?;
            Ok(CardOwner::client(contract.id, staff_id))
        }
    }
}
