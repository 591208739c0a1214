//! Persistent state of CSV import tasks.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::db::db_utils::{conversion_error, get_opt_ts, ts_to_db};
use crate::errors::{AppError, AppResult};
use crate::models::{ImportTask, RowError, TaskStatus};

fn map_task(row: &Row) -> rusqlite::Result<ImportTask> {
    let status_str: String = row.get("status")?;
    let status = TaskStatus::from_db_str(&status_str).ok_or_else(|| {
        conversion_error(AppError::ConstraintViolated(format!(
            "invalid task status: {status_str}"
        )))
    })?;
    let errors_raw: String = row.get("errors")?;
    let errors: Vec<RowError> =
        serde_json::from_str(&errors_raw).map_err(|e| conversion_error(AppError::Json(e)))?;

    Ok(ImportTask {
        id: row.get("id")?,
        file_path: row.get("file_path")?,
        status,
        progress: row.get("progress")?,
        total: row.get("total")?,
        imported_count: row.get("imported_count")?,
        errors,
        start_time: get_opt_ts(row, "start_time")?,
        elapsed_seconds: row.get("elapsed_seconds")?,
        eta_seconds: row.get("eta_seconds")?,
    })
}

pub fn insert_task(conn: &Connection, tenant_id: i64, task: &ImportTask) -> AppResult<()> {
    conn.execute(
        "INSERT INTO import_tasks (id, tenant_id, file_path, status, progress, total,
                                   imported_count, errors, start_time, elapsed_seconds,
                                   eta_seconds)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            task.id,
            tenant_id,
            task.file_path,
            task.status.to_db_str(),
            task.progress,
            task.total,
            task.imported_count,
            serde_json::to_string(&task.errors)?,
            task.start_time.as_ref().map(ts_to_db),
            task.elapsed_seconds,
            task.eta_seconds,
        ],
    )?;
    Ok(())
}

pub fn find_task(conn: &Connection, tenant_id: i64, id: &str) -> AppResult<Option<ImportTask>> {
    Ok(conn
        .query_row(
            "SELECT * FROM import_tasks WHERE tenant_id = ?1 AND id = ?2",
            params![tenant_id, id],
            map_task,
        )
        .optional()?)
}

pub fn get_task(conn: &Connection, tenant_id: i64, id: &str) -> AppResult<ImportTask> {
    find_task(conn, tenant_id, id)?.ok_or_else(|| AppError::NotFound(format!("import task {id}")))
}

/// Write progress fields. A task already moved to a terminal status by
/// someone else keeps that status.
pub fn update_task(conn: &Connection, tenant_id: i64, task: &ImportTask) -> AppResult<()> {
    conn.execute(
        "UPDATE import_tasks
         SET status = CASE WHEN status = 'cancelled' THEN status ELSE ?3 END,
             progress = ?4, total = ?5, imported_count = ?6, errors = ?7,
             start_time = ?8, elapsed_seconds = ?9, eta_seconds = ?10
         WHERE tenant_id = ?1 AND id = ?2",
        params![
            tenant_id,
            task.id,
            task.status.to_db_str(),
            task.progress,
            task.total,
            task.imported_count,
            serde_json::to_string(&task.errors)?,
            task.start_time.as_ref().map(ts_to_db),
            task.elapsed_seconds,
            task.eta_seconds,
        ],
    )?;
    Ok(())
}

pub fn load_status(conn: &Connection, tenant_id: i64, id: &str) -> AppResult<TaskStatus> {
    Ok(get_task(conn, tenant_id, id)?.status)
}

/// Force the status, used for cancellation.
pub fn set_status(
    conn: &Connection,
    tenant_id: i64,
    id: &str,
    status: TaskStatus,
) -> AppResult<bool> {
    let n = conn.execute(
        "UPDATE import_tasks SET status = ?3 WHERE tenant_id = ?1 AND id = ?2",
        params![tenant_id, id, status.to_db_str()],
    )?;
    Ok(n > 0)
}
