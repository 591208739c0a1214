use std::str::FromStr;

use chrono::NaiveTime;
use rust_decimal::Decimal;

use crate::cli::commands::{open_pool, resolve_owner};
use crate::cli::parser::{Commands, TimecardAction};
use crate::config::Config;
use crate::core::timecard::TimecardLogic;
use crate::core::timesheet::TimesheetLogic;
use crate::errors::{AppError, AppResult};
use crate::models::{Scope, Timecard, Timesheet, WorkType, YearMonth};
use crate::ui::messages::{header, info, success, warning};
use crate::utils::colors::{color_for_status, colorize_optional, paint};
use crate::utils::date::parse_date_strict;
use crate::utils::formatting::{days2readable, mins2readable};
use crate::utils::table::Table;
use crate::utils::time::parse_optional_time;

fn clock(t: Option<NaiveTime>, next_day: bool) -> String {
    match t {
        Some(t) if next_day => format!("{}+1", t.format("%H:%M")),
        Some(t) => t.format("%H:%M").to_string(),
        None => "--:--".into(),
    }
}

fn print_cards(cards: &[Timecard]) {
    let mut table = Table::new([
        "Date", "Type", "In", "Out", "Break", "Work", "Over", "Night", "Holiday", "Leave",
    ]);
    for c in cards {
        table.add_row(vec![
            c.work_date.format("%Y-%m-%d %a").to_string(),
            c.work_type.label().to_string(),
            colorize_optional(&clock(c.start_time, c.start_time_next_day)),
            colorize_optional(&clock(c.end_time, c.end_time_next_day)),
            c.break_minutes.to_string(),
            colorize_optional(&mins2readable(c.counters.work_minutes, false, true)),
            colorize_optional(&mins2readable(c.counters.overtime_minutes, false, true)),
            colorize_optional(&mins2readable(c.counters.late_night_minutes, false, true)),
            colorize_optional(&mins2readable(c.counters.holiday_work_minutes, false, true)),
            days2readable(c.paid_leave_days),
        ]);
    }
    print!("{}", table.render());
}

pub(crate) fn print_totals(sheet: &Timesheet) {
    let t = &sheet.totals;
    info(format!(
        "{} {} [{}]",
        sheet.owner,
        sheet.target_month,
        paint(color_for_status(sheet.status), sheet.status.as_str())
    ));
    println!(
        "  days {} / absence {} / paid leave {}",
        t.work_days,
        t.absence_days,
        days2readable(t.paid_leave_days)
    );
    println!(
        "  work {} / overtime {} / late-night {} / holiday {}",
        mins2readable(t.work_minutes, false, false),
        mins2readable(t.overtime_minutes, false, false),
        mins2readable(t.late_night_minutes, false, false),
        mins2readable(t.holiday_work_minutes, false, false)
    );
    println!(
        "  premium {} / deduction {} / variable {}",
        mins2readable(t.premium_minutes, false, false),
        mins2readable(t.deduction_minutes, false, false),
        mins2readable(t.variable_minutes, false, false)
    );
}

pub fn handle(cmd: &Commands, cfg: &Config, scope: &Scope) -> AppResult<()> {
    match cmd {
        Commands::Timecard { action } => handle_action(action, cfg, scope),

        Commands::Recompute {
            contract,
            month,
            staff,
        } => {
            let month = YearMonth::from_str(month)?;
            let mut pool = open_pool(cfg)?;
            let owner = resolve_owner(&pool.conn, scope, *contract, *staff)?;
            let sheet = TimesheetLogic::recompute_month(&mut pool, scope, owner, month)?;
            success("Timesheet recomputed");
            print_totals(&sheet);
            Ok(())
        }

        _ => Ok(()),
    }
}

fn handle_action(action: &TimecardAction, cfg: &Config, scope: &Scope) -> AppResult<()> {
    let mut pool = open_pool(cfg)?;

    match action {
        TimecardAction::Set {
            contract,
            staff,
            date,
            work_type,
            slot,
            start,
            start_next_day,
            end,
            end_next_day,
            break_minutes,
            paid_leave,
            memo,
        } => {
            let owner = resolve_owner(&pool.conn, scope, *contract, *staff)?;
            let work_date = parse_date_strict(date)?;
            let work_type = WorkType::from_code(*work_type).ok_or_else(|| {
                AppError::ConstraintViolated(format!("unknown work type code {work_type}"))
            })?;

            let mut card = Timecard::new(owner, work_date, work_type);
            card.work_time_slot = slot.clone();
            card.start_time = parse_optional_time(start.as_deref())?;
            card.start_time_next_day = *start_next_day;
            card.end_time = parse_optional_time(end.as_deref())?;
            card.end_time_next_day = *end_next_day;
            card.break_minutes = *break_minutes;
            card.paid_leave_days = Decimal::from_str(paid_leave).map_err(|_| {
                AppError::ConstraintViolated(format!("invalid paid leave days '{paid_leave}'"))
            })?;
            card.memo = memo.clone();

            let saved = TimecardLogic::save(&mut pool, scope, card, false)?;
            success(format!(
                "Timecard saved: {} {}",
                saved.owner,
                saved.work_date.format("%Y-%m-%d")
            ));
            print_cards(std::slice::from_ref(&saved));
        }

        TimecardAction::Del {
            contract,
            staff,
            date,
        } => {
            let owner = resolve_owner(&pool.conn, scope, *contract, *staff)?;
            let work_date = parse_date_strict(date)?;
            TimecardLogic::delete(&mut pool, scope, owner, work_date)?;
            success(format!(
                "Timecard deleted: {owner} {}",
                work_date.format("%Y-%m-%d")
            ));
        }

        TimecardAction::List {
            contract,
            staff,
            month,
            json,
        } => {
            let month = YearMonth::from_str(month)?;
            let owner = resolve_owner(&pool.conn, scope, *contract, *staff)?;
            let cards = TimecardLogic::list(&pool.conn, scope, owner, month)?;
            let sheet = TimesheetLogic::find(&pool.conn, scope, owner, month)?;

            if *json {
                let doc = serde_json::json!({ "timecards": cards, "timesheet": sheet });
                println!("{}", serde_json::to_string_pretty(&doc)?);
                return Ok(());
            }

            header(format!("Timecards {owner} {month}"));
            if cards.is_empty() {
                warning("No timecards for this month");
            } else {
                print_cards(&cards);
            }
            if let Some(sheet) = sheet {
                println!();
                print_totals(&sheet);
            }
        }
    }

    Ok(())
}
