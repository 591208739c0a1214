//! Raw punch records and their breaks.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::db::db_utils::{
    date_to_db, get_date, get_location, get_opt_ts, get_ts, location_cols, ts_to_db,
};
use crate::errors::{AppError, AppResult};
use crate::models::{Location, Timerecord, TimerecordBreak};

fn map_record(row: &Row) -> rusqlite::Result<Timerecord> {
    Ok(Timerecord {
        id: row.get("id")?,
        staff_id: row.get("staff_id")?,
        staff_contract_id: row.get("staff_contract_id")?,
        work_date: get_date(row, "work_date")?,
        start_time: get_ts(row, "start_time")?,
        end_time: get_opt_ts(row, "end_time")?,
        rounded_start_time: get_ts(row, "rounded_start_time")?,
        rounded_end_time: get_opt_ts(row, "rounded_end_time")?,
        start_location: get_location(row, "start")?,
        end_location: get_location(row, "end")?,
        memo: row.get("memo")?,
        breaks: Vec::new(),
    })
}

fn map_break(row: &Row) -> rusqlite::Result<TimerecordBreak> {
    Ok(TimerecordBreak {
        id: row.get("id")?,
        timerecord_id: row.get("timerecord_id")?,
        break_start: get_ts(row, "break_start")?,
        break_end: get_opt_ts(row, "break_end")?,
        rounded_break_start: get_ts(row, "rounded_break_start")?,
        rounded_break_end: get_opt_ts(row, "rounded_break_end")?,
        start_location: get_location(row, "start")?,
        end_location: get_location(row, "end")?,
    })
}

fn load_breaks(conn: &Connection, tenant_id: i64, record_id: i64) -> AppResult<Vec<TimerecordBreak>> {
    let mut stmt = conn.prepare_cached(
        "SELECT * FROM timerecord_breaks
         WHERE tenant_id = ?1 AND timerecord_id = ?2
         ORDER BY break_start ASC, id ASC",
    )?;
    let rows = stmt.query_map(params![tenant_id, record_id], map_break)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

fn with_breaks(conn: &Connection, tenant_id: i64, mut rec: Timerecord) -> AppResult<Timerecord> {
    rec.breaks = load_breaks(conn, tenant_id, rec.id)?;
    Ok(rec)
}

pub fn find_record(conn: &Connection, tenant_id: i64, id: i64) -> AppResult<Option<Timerecord>> {
    let rec = conn
        .query_row(
            "SELECT * FROM timerecords WHERE tenant_id = ?1 AND id = ?2",
            params![tenant_id, id],
            map_record,
        )
        .optional()?;
    rec.map(|r| with_breaks(conn, tenant_id, r)).transpose()
}

pub fn get_record(conn: &Connection, tenant_id: i64, id: i64) -> AppResult<Timerecord> {
    find_record(conn, tenant_id, id)?
        .ok_or_else(|| AppError::NotFound(format!("timerecord {id}")))
}

pub fn find_record_for_day(
    conn: &Connection,
    tenant_id: i64,
    staff_contract_id: i64,
    work_date: NaiveDate,
) -> AppResult<Option<Timerecord>> {
    let rec = conn
        .query_row(
            "SELECT * FROM timerecords
             WHERE tenant_id = ?1 AND staff_contract_id = ?2 AND work_date = ?3",
            params![tenant_id, staff_contract_id, date_to_db(work_date)],
            map_record,
        )
        .optional()?;
    rec.map(|r| with_breaks(conn, tenant_id, r)).transpose()
}

/// Records of one staff member on one date, any contract.
pub fn records_of_staff_on(
    conn: &Connection,
    tenant_id: i64,
    staff_id: i64,
    work_date: NaiveDate,
) -> AppResult<Vec<Timerecord>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM timerecords
         WHERE tenant_id = ?1 AND staff_id = ?2 AND work_date = ?3
         ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![tenant_id, staff_id, date_to_db(work_date)], map_record)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(with_breaks(conn, tenant_id, r?)?);
    }
    Ok(out)
}

/// Records of a staff contract with `from <= work_date <= to`.
pub fn records_in_range(
    conn: &Connection,
    tenant_id: i64,
    staff_contract_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> AppResult<Vec<Timerecord>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM timerecords
         WHERE tenant_id = ?1 AND staff_contract_id = ?2
           AND work_date BETWEEN ?3 AND ?4
         ORDER BY work_date ASC",
    )?;
    let rows = stmt.query_map(
        params![tenant_id, staff_contract_id, date_to_db(from), date_to_db(to)],
        map_record,
    )?;
    let mut out = Vec::new();
    for r in rows {
        out.push(with_breaks(conn, tenant_id, r?)?);
    }
    Ok(out)
}

pub fn insert_record(conn: &Connection, tenant_id: i64, rec: &Timerecord) -> AppResult<i64> {
    let (s_lat, s_lon, s_addr) = location_cols(rec.start_location.as_ref());
    let (e_lat, e_lon, e_addr) = location_cols(rec.end_location.as_ref());
    conn.execute(
        "INSERT INTO timerecords (tenant_id, staff_id, staff_contract_id, work_date,
                                  start_time, end_time, rounded_start_time, rounded_end_time,
                                  start_lat, start_lon, start_address,
                                  end_lat, end_lon, end_address, memo)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
        params![
            tenant_id,
            rec.staff_id,
            rec.staff_contract_id,
            date_to_db(rec.work_date),
            ts_to_db(&rec.start_time),
            rec.end_time.as_ref().map(ts_to_db),
            ts_to_db(&rec.rounded_start_time),
            rec.rounded_end_time.as_ref().map(ts_to_db),
            s_lat,
            s_lon,
            s_addr,
            e_lat,
            e_lon,
            e_addr,
            rec.memo,
        ],
    )
    .map_err(|e| AppError::from_unique(e, "timerecord for this contract and date"))?;
    Ok(conn.last_insert_rowid())
}

/// Rewrite every column of the record row (breaks are stored separately).
pub fn update_record(conn: &Connection, tenant_id: i64, rec: &Timerecord) -> AppResult<()> {
    let (s_lat, s_lon, s_addr) = location_cols(rec.start_location.as_ref());
    let (e_lat, e_lon, e_addr) = location_cols(rec.end_location.as_ref());
    let changed = conn.execute(
        "UPDATE timerecords
         SET work_date = ?3, start_time = ?4, end_time = ?5,
             rounded_start_time = ?6, rounded_end_time = ?7,
             start_lat = ?8, start_lon = ?9, start_address = ?10,
             end_lat = ?11, end_lon = ?12, end_address = ?13, memo = ?14
         WHERE tenant_id = ?1 AND id = ?2",
        params![
            tenant_id,
            rec.id,
            date_to_db(rec.work_date),
            ts_to_db(&rec.start_time),
            rec.end_time.as_ref().map(ts_to_db),
            ts_to_db(&rec.rounded_start_time),
            rec.rounded_end_time.as_ref().map(ts_to_db),
            s_lat,
            s_lon,
            s_addr,
            e_lat,
            e_lon,
            e_addr,
            rec.memo,
        ],
    )
    .map_err(|e| AppError::from_unique(e, "timerecord for this contract and date"))?;
    if changed == 0 {
        return Err(AppError::NotFound(format!("timerecord {}", rec.id)));
    }
    Ok(())
}

pub fn delete_record(conn: &Connection, tenant_id: i64, id: i64) -> AppResult<()> {
    conn.execute(
        "DELETE FROM timerecord_breaks WHERE tenant_id = ?1 AND timerecord_id = ?2",
        params![tenant_id, id],
    )?;
    conn.execute(
        "DELETE FROM timerecords WHERE tenant_id = ?1 AND id = ?2",
        params![tenant_id, id],
    )?;
    Ok(())
}

pub fn insert_break(conn: &Connection, tenant_id: i64, b: &TimerecordBreak) -> AppResult<i64> {
    let (s_lat, s_lon, s_addr) = location_cols(b.start_location.as_ref());
    let (e_lat, e_lon, e_addr) = location_cols(b.end_location.as_ref());
    conn.execute(
        "INSERT INTO timerecord_breaks (tenant_id, timerecord_id, break_start, break_end,
                                        rounded_break_start, rounded_break_end,
                                        start_lat, start_lon, start_address,
                                        end_lat, end_lon, end_address)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            tenant_id,
            b.timerecord_id,
            ts_to_db(&b.break_start),
            b.break_end.as_ref().map(ts_to_db),
            ts_to_db(&b.rounded_break_start),
            b.rounded_break_end.as_ref().map(ts_to_db),
            s_lat,
            s_lon,
            s_addr,
            e_lat,
            e_lon,
            e_addr,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update_break(conn: &Connection, tenant_id: i64, b: &TimerecordBreak) -> AppResult<()> {
    let (s_lat, s_lon, s_addr) = location_cols(b.start_location.as_ref());
    let (e_lat, e_lon, e_addr) = location_cols(b.end_location.as_ref());
    let changed = conn.execute(
        "UPDATE timerecord_breaks
         SET break_start = ?3, break_end = ?4, rounded_break_start = ?5,
             rounded_break_end = ?6, start_lat = ?7, start_lon = ?8, start_address = ?9,
             end_lat = ?10, end_lon = ?11, end_address = ?12
         WHERE tenant_id = ?1 AND id = ?2",
        params![
            tenant_id,
            b.id,
            ts_to_db(&b.break_start),
            b.break_end.as_ref().map(ts_to_db),
            ts_to_db(&b.rounded_break_start),
            b.rounded_break_end.as_ref().map(ts_to_db),
            s_lat,
            s_lon,
            s_addr,
            e_lat,
            e_lon,
            e_addr,
        ],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound(format!("break {}", b.id)));
    }
    Ok(())
}

pub fn delete_break(conn: &Connection, tenant_id: i64, id: i64) -> AppResult<()> {
    conn.execute(
        "DELETE FROM timerecord_breaks WHERE tenant_id = ?1 AND id = ?2",
        params![tenant_id, id],
    )?;
    Ok(())
}

/// Which location column pair an address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSlot {
    RecordStart,
    RecordEnd,
    BreakStart,
    BreakEnd,
}

/// Fill in a geocoded address after the punch has been committed.
pub fn set_address(
    conn: &Connection,
    tenant_id: i64,
    slot: AddressSlot,
    row_id: i64,
    location: &Location,
) -> AppResult<()> {
    let sql = match slot {
        AddressSlot::RecordStart => {
            "UPDATE timerecords SET start_address = ?3 WHERE tenant_id = ?1 AND id = ?2"
        }
        AddressSlot::RecordEnd => {
            "UPDATE timerecords SET end_address = ?3 WHERE tenant_id = ?1 AND id = ?2"
        }
        AddressSlot::BreakStart => {
            "UPDATE timerecord_breaks SET start_address = ?3 WHERE tenant_id = ?1 AND id = ?2"
        }
        AddressSlot::BreakEnd => {
            "UPDATE timerecord_breaks SET end_address = ?3 WHERE tenant_id = ?1 AND id = ?2"
        }
    };
    conn.execute(sql, params![tenant_id, row_id, location.address])?;
    Ok(())
}

pub fn find_break(
    conn: &Connection,
    tenant_id: i64,
    id: i64,
) -> AppResult<Option<TimerecordBreak>> {
    Ok(conn
        .query_row(
            "SELECT * FROM timerecord_breaks WHERE tenant_id = ?1 AND id = ?2",
            params![tenant_id, id],
            map_break,
        )
        .optional()?)
}
