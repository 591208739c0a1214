//! Bulk load of master data from a YAML document.
//!
//! ```yaml
//! staff:
//!   - { id: 1, employee_no: "E001", name: "Sato" }
//! time_punch_configs: [...]
//! work_time_patterns: [...]
//! overtime_patterns:
//!   - { id: 1, name: "std", calculation_type: premium, daily_threshold: { hours: 8 } }
//! contracts: [...]
//! assignments: [...]
//! ```
//!
//! Everything is inserted in one transaction, in dependency order.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::log::ttlog;
use crate::db::master::{
    insert_assignment, insert_contract, insert_overtime_pattern, insert_staff,
    insert_time_punch_config, insert_work_time_pattern,
};
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::models::{
    Assignment, Contract, OvertimePattern, Scope, Staff, TimePunchConfig, WorkTimePattern,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct MasterData {
    pub staff: Vec<Staff>,
    pub time_punch_configs: Vec<TimePunchConfig>,
    pub work_time_patterns: Vec<WorkTimePattern>,
    pub overtime_patterns: Vec<OvertimePattern>,
    pub contracts: Vec<Contract>,
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct MasterSummary {
    pub staff: usize,
    pub time_punch_configs: usize,
    pub work_time_patterns: usize,
    pub overtime_patterns: usize,
    pub contracts: usize,
    pub assignments: usize,
}

pub struct MasterLogic;

impl MasterLogic {
    pub fn parse(yaml: &str) -> AppResult<MasterData> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load_file(pool: &mut DbPool, scope: &Scope, path: &Path) -> AppResult<MasterSummary> {
        let text = fs::read_to_string(path)?;
        Self::load(pool, scope, &Self::parse(&text)?)
    }

    pub fn load(pool: &mut DbPool, scope: &Scope, data: &MasterData) -> AppResult<MasterSummary> {
        let tenant = scope.tenant_id;
        let summary = pool.immediate(|conn| {
            for s in &data.staff {
                insert_staff(conn, tenant, s)?;
            }
            for c in &data.time_punch_configs {
                insert_time_punch_config(conn, tenant, c)?;
            }
            for p in &data.work_time_patterns {
                insert_work_time_pattern(conn, tenant, p)?;
            }
            for p in &data.overtime_patterns {
                insert_overtime_pattern(conn, tenant, p)?;
            }
            for c in &data.contracts {
                insert_contract(conn, tenant, c)?;
            }
            for a in &data.assignments {
                insert_assignment(conn, tenant, a)?;
            }

            let summary = MasterSummary {
                staff: data.staff.len(),
                time_punch_configs: data.time_punch_configs.len(),
                work_time_patterns: data.work_time_patterns.len(),
                overtime_patterns: data.overtime_patterns.len(),
                contracts: data.contracts.len(),
                assignments: data.assignments.len(),
            };
            ttlog(
                conn,
                scope,
                "master_load",
                "master",
                &serde_json::to_string(&summary)?,
            )?;
            Ok(summary)
        })?;

        info!(?summary, "master data loaded");
        Ok(summary)
    }
}
