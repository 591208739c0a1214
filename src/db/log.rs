use crate::errors::AppResult;
use crate::models::Scope;
use chrono::Local;
use rusqlite::{Connection, params};
use serde::Serialize;

/// Write an audit line into the `log` table.
///
/// Called inside the caller's transaction, so the line only survives when
/// the mutation it describes is committed.
pub fn ttlog(
    conn: &Connection,
    scope: &Scope,
    operation: &str,
    target: &str,
    message: &str,
) -> AppResult<()> {
    let now = Local::now().to_rfc3339();

    let mut stmt = conn.prepare_cached(
        "INSERT INTO log (date, tenant_id, actor, operation, target, message)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;

    stmt.execute(params![
        now,
        scope.tenant_id,
        scope.actor.to_string(),
        operation,
        target,
        message
    ])?;

    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct LogLine {
    pub id: i64,
    pub date: String,
    pub actor: String,
    pub operation: String,
    pub target: String,
    pub message: String,
}

/// Audit lines of a tenant, oldest first. Migration lines (tenant 0) are
/// always included.
pub fn load_log(conn: &Connection, tenant_id: i64) -> AppResult<Vec<LogLine>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, actor, operation, target, message
         FROM log
         WHERE tenant_id IN (0, ?1)
         ORDER BY id ASC",
    )?;

    let rows = stmt.query_map([tenant_id], |row| {
        Ok(LogLine {
            id: row.get(0)?,
            date: row.get(1)?,
            actor: row.get(2)?,
            operation: row.get(3)?,
            target: row.get(4)?,
            message: row.get(5)?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}
