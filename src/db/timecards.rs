//! Daily attendance rows, staff side and client side.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::db::db_utils::{
    bool_to_db, conversion_error, date_to_db, get_bool, get_date, get_decimal, get_opt_time,
    time_to_db,
};
use crate::errors::{AppError, AppResult};
use crate::models::{CardOwner, DailyCounters, Side, Timecard, WorkType, YearMonth};

fn map_card(row: &Row) -> rusqlite::Result<Timecard> {
    let side_str: String = row.get("side")?;
    let side = Side::from_db_str(&side_str).ok_or_else(|| {
        conversion_error(AppError::ConstraintViolated(format!("invalid side: {side_str}")))
    })?;
    let code: i64 = row.get("work_type")?;
    let work_type = WorkType::from_code(code).ok_or_else(|| {
        conversion_error(AppError::ConstraintViolated(format!("invalid work_type: {code}")))
    })?;

    Ok(Timecard {
        id: row.get("id")?,
        owner: CardOwner {
            side,
            contract_id: row.get("contract_id")?,
            staff_id: row.get("staff_id")?,
        },
        work_date: get_date(row, "work_date")?,
        work_type,
        work_time_slot: row.get("work_time_slot")?,
        start_time: get_opt_time(row, "start_time")?,
        start_time_next_day: get_bool(row, "start_time_next_day")?,
        end_time: get_opt_time(row, "end_time")?,
        end_time_next_day: get_bool(row, "end_time_next_day")?,
        break_minutes: row.get("break_minutes")?,
        late_night_break_minutes: row.get("late_night_break_minutes")?,
        paid_leave_days: get_decimal(row, "paid_leave_days")?,
        memo: row.get("memo")?,
        counters: DailyCounters {
            work_minutes: row.get("work_minutes")?,
            overtime_minutes: row.get("overtime_minutes")?,
            late_night_minutes: row.get("late_night_minutes")?,
            holiday_work_minutes: row.get("holiday_work_minutes")?,
        },
    })
}

pub fn find_card(
    conn: &Connection,
    tenant_id: i64,
    owner: &CardOwner,
    work_date: NaiveDate,
) -> AppResult<Option<Timecard>> {
    Ok(conn
        .query_row(
            "SELECT * FROM timecards
             WHERE tenant_id = ?1 AND side = ?2 AND contract_id = ?3 AND staff_id = ?4
               AND work_date = ?5",
            params![
                tenant_id,
                owner.side.to_db_str(),
                owner.contract_id,
                owner.staff_id,
                date_to_db(work_date)
            ],
            map_card,
        )
        .optional()?)
}

/// Cards of one owner in `[from, to]`, by date.
pub fn cards_in_range(
    conn: &Connection,
    tenant_id: i64,
    owner: &CardOwner,
    from: NaiveDate,
    to: NaiveDate,
) -> AppResult<Vec<Timecard>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM timecards
         WHERE tenant_id = ?1 AND side = ?2 AND contract_id = ?3 AND staff_id = ?4
           AND work_date BETWEEN ?5 AND ?6
         ORDER BY work_date ASC",
    )?;
    let rows = stmt.query_map(
        params![
            tenant_id,
            owner.side.to_db_str(),
            owner.contract_id,
            owner.staff_id,
            date_to_db(from),
            date_to_db(to)
        ],
        map_card,
    )?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn cards_of_month(
    conn: &Connection,
    tenant_id: i64,
    owner: &CardOwner,
    month: YearMonth,
) -> AppResult<Vec<Timecard>> {
    cards_in_range(conn, tenant_id, owner, month.first_day(), month.last_day())
}

/// Insert or replace the row keyed by `(side, contract, staff, work_date)`.
/// Returns the row id.
pub fn upsert_card(conn: &Connection, tenant_id: i64, card: &Timecard) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO timecards (tenant_id, side, contract_id, staff_id, work_date, work_type,
                                work_time_slot, start_time, start_time_next_day, end_time,
                                end_time_next_day, break_minutes, late_night_break_minutes,
                                paid_leave_days, memo, work_minutes, overtime_minutes,
                                late_night_minutes, holiday_work_minutes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                 ?18, ?19)
         ON CONFLICT (tenant_id, side, contract_id, staff_id, work_date) DO UPDATE SET
             work_type = excluded.work_type,
             work_time_slot = excluded.work_time_slot,
             start_time = excluded.start_time,
             start_time_next_day = excluded.start_time_next_day,
             end_time = excluded.end_time,
             end_time_next_day = excluded.end_time_next_day,
             break_minutes = excluded.break_minutes,
             late_night_break_minutes = excluded.late_night_break_minutes,
             paid_leave_days = excluded.paid_leave_days,
             memo = excluded.memo,
             work_minutes = excluded.work_minutes,
             overtime_minutes = excluded.overtime_minutes,
             late_night_minutes = excluded.late_night_minutes,
             holiday_work_minutes = excluded.holiday_work_minutes",
        params![
            tenant_id,
            card.owner.side.to_db_str(),
            card.owner.contract_id,
            card.owner.staff_id,
            date_to_db(card.work_date),
            card.work_type.code(),
            card.work_time_slot,
            card.start_time.map(time_to_db),
            bool_to_db(card.start_time_next_day),
            card.end_time.map(time_to_db),
            bool_to_db(card.end_time_next_day),
            card.break_minutes,
            card.late_night_break_minutes,
            card.paid_leave_days.to_string(),
            card.memo,
            card.counters.work_minutes,
            card.counters.overtime_minutes,
            card.counters.late_night_minutes,
            card.counters.holiday_work_minutes,
        ],
    )?;

    let id = conn.query_row(
        "SELECT id FROM timecards
         WHERE tenant_id = ?1 AND side = ?2 AND contract_id = ?3 AND staff_id = ?4
           AND work_date = ?5",
        params![
            tenant_id,
            card.owner.side.to_db_str(),
            card.owner.contract_id,
            card.owner.staff_id,
            date_to_db(card.work_date)
        ],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Returns whether a row was deleted.
pub fn delete_card(
    conn: &Connection,
    tenant_id: i64,
    owner: &CardOwner,
    work_date: NaiveDate,
) -> AppResult<bool> {
    let n = conn.execute(
        "DELETE FROM timecards
         WHERE tenant_id = ?1 AND side = ?2 AND contract_id = ?3 AND staff_id = ?4
           AND work_date = ?5",
        params![
            tenant_id,
            owner.side.to_db_str(),
            owner.contract_id,
            owner.staff_id,
            date_to_db(work_date)
        ],
    )?;
    Ok(n > 0)
}

/// Remove every row of `owner` in `month`; returns how many went.
pub fn delete_cards_of_month(
    conn: &Connection,
    tenant_id: i64,
    owner: &CardOwner,
    month: YearMonth,
) -> AppResult<usize> {
    Ok(conn.execute(
        "DELETE FROM timecards
         WHERE tenant_id = ?1 AND side = ?2 AND contract_id = ?3 AND staff_id = ?4
           AND work_date BETWEEN ?5 AND ?6",
        params![
            tenant_id,
            owner.side.to_db_str(),
            owner.contract_id,
            owner.staff_id,
            date_to_db(month.first_day()),
            date_to_db(month.last_day())
        ],
    )?)
}
