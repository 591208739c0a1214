use crate::cli::parser::Cli;
use crate::config::Config;
use crate::db::log::ttlog;
use crate::db::pool::DbPool;
use crate::errors::AppResult;
use crate::models::Scope;
use crate::ui::messages::{info, success, warning};

/// Handle the `init` command
///
/// Creates the config directory, writes the configuration file (skipped in
/// test mode) and brings the database schema up to date.
pub fn handle(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let created = Config::init_all(cli.db.as_deref(), cli.test)?;

    info(format!("Config file : {}", Config::config_file().display()));
    info(format!("Database    : {}", created.database));

    let mut pool = DbPool::open(&created.database)?;

    let scope = Scope::system(cfg.tenant_id);
    if let Err(e) = pool.immediate(|conn| {
        ttlog(
            conn,
            &scope,
            "init",
            "database",
            &format!("Database initialized at {}", created.database),
        )
    }) {
        warning(format!("Failed to write internal log: {e}"));
    }

    success("rkintai initialization completed");
    Ok(())
}
