use std::str::FromStr;

use chrono::Local;

use crate::cli::commands::open_pool;
use crate::cli::parser::{Commands, ImportAction};
use crate::config::Config;
use crate::core::import::{ImportEncoding, ImportLogic};
use crate::errors::AppResult;
use crate::models::{ImportTask, Scope};
use crate::ui::messages::{error, info, success, warning};
use crate::utils::path::expand_tilde;

fn print_task(task: &ImportTask) {
    info(format!(
        "task {} [{}] {}/{} rows, {} imported, {} errors, elapsed {:.1}s{}",
        task.id,
        task.status.to_db_str(),
        task.progress,
        task.total,
        task.imported_count,
        task.errors.len(),
        task.elapsed_seconds,
        task.eta_seconds
            .map(|eta| format!(", eta {eta:.1}s"))
            .unwrap_or_default()
    ));
    for e in &task.errors {
        warning(e);
    }
}

pub fn handle(cmd: &Commands, cfg: &Config, scope: &Scope) -> AppResult<()> {
    let Commands::Import { action } = cmd else {
        return Ok(());
    };
    let mut pool = open_pool(cfg)?;

    match action {
        ImportAction::Upload { file } => {
            let id = ImportLogic::upload(
                &mut pool,
                scope,
                &expand_tilde(file),
                Local::now().fixed_offset(),
            )?;
            success("Import file uploaded");
            println!("{id}");
        }

        ImportAction::Run { id, encoding } => {
            let encoding = match encoding {
                Some(raw) => ImportEncoding::from_str(raw)?,
                None => cfg.import_encoding,
            };
            let clock = || Local::now().fixed_offset();
            let task = ImportLogic::process(&mut pool, scope, id, encoding, &clock)?;
            if task.errors.is_empty() {
                success("Import finished");
            } else {
                error("Import finished with row errors");
            }
            print_task(&task);
        }

        ImportAction::Progress { id } => {
            let task = ImportLogic::progress(&pool.conn, scope, id)?;
            print_task(&task);
        }

        ImportAction::Cancel { id } => {
            ImportLogic::cancel(&mut pool, scope, id)?;
            success(format!("Import task {id} cancelled"));
        }
    }

    Ok(())
}
