//! rkintai library root.
//! Attendance core: time punches, daily and monthly calculation, approvals
//! and client sync, plus the thin CLI built on top of it.

pub mod cli;
pub mod config;
pub mod core;
pub mod db;
pub mod errors;
pub mod models;
pub mod ui;
pub mod utils;

use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;
use models::{Actor, Scope};

/// Central command dispatcher
pub fn dispatch(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let scope = Scope::new(cfg.tenant_id, Actor::Operator(cli.operator.clone()));

    match &cli.command {
        Commands::Init => cli::commands::init::handle(cli, cfg),
        Commands::Config { .. } => cli::commands::config::handle(&cli.command, cfg),
        Commands::Master { .. } => cli::commands::master::handle(&cli.command, cfg, &scope),
        Commands::Punch { .. } | Commands::Status { .. } => {
            cli::commands::punch::handle(&cli.command, cfg, &scope)
        }
        Commands::Timecard { .. } | Commands::Recompute { .. } => {
            cli::commands::timecard::handle(&cli.command, cfg, &scope)
        }
        Commands::Submit { .. }
        | Commands::Withdraw { .. }
        | Commands::Approve { .. }
        | Commands::Reject { .. } => cli::commands::approval::handle(&cli.command, cfg, &scope),
        Commands::Import { .. } => cli::commands::import::handle(&cli.command, cfg, &scope),
        Commands::Log { .. } => cli::commands::log::handle(&cli.command, cfg, &scope),
    }
}

/// Load the configuration once and apply the `--db` override.
pub fn load_config(cli: &Cli) -> AppResult<Config> {
    let mut cfg = Config::load()?;
    if let Some(custom_db) = &cli.db {
        cfg.database = utils::path::expand_tilde(custom_db)
            .to_string_lossy()
            .to_string();
    }
    Ok(cfg)
}
