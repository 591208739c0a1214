use crate::cli::commands::open_pool;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::log::load_log;
use crate::errors::AppResult;
use crate::models::Scope;
use crate::ui::messages::{header, warning};
use crate::utils::colors::{color_for_operation, paint};
use crate::utils::table::Table;

const MAX_TARGET: usize = 40;

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max - 3).collect();
    out.push_str("...");
    out
}

pub fn handle(cmd: &Commands, cfg: &Config, scope: &Scope) -> AppResult<()> {
    if !matches!(cmd, Commands::Log { print: true }) {
        return Ok(());
    }

    let pool = open_pool(cfg)?;
    let lines = load_log(&pool.conn, scope.tenant_id)?;
    if lines.is_empty() {
        warning("The internal log is empty");
        return Ok(());
    }

    header("Internal log");
    let mut table = Table::new(["#", "Date", "Actor", "Operation", "Target", "Message"]);
    for l in &lines {
        let date = chrono::DateTime::parse_from_rfc3339(&l.date)
            .map(|dt| dt.format("%F %T").to_string())
            .unwrap_or_else(|_| l.date.clone());
        table.add_row(vec![
            l.id.to_string(),
            date,
            l.actor.clone(),
            paint(color_for_operation(&l.operation), &l.operation),
            truncate(&l.target, MAX_TARGET),
            l.message.clone(),
        ]);
    }
    print!("{}", table.render());

    Ok(())
}
