use crate::cli::parser::{Commands, MasterAction};
use crate::cli::commands::open_pool;
use crate::config::Config;
use crate::core::master::MasterLogic;
use crate::errors::AppResult;
use crate::models::Scope;
use crate::ui::messages::success;
use crate::utils::path::expand_tilde;

pub fn handle(cmd: &Commands, cfg: &Config, scope: &Scope) -> AppResult<()> {
    let Commands::Master { action } = cmd else {
        return Ok(());
    };

    match action {
        MasterAction::Load { file } => {
            let mut pool = open_pool(cfg)?;
            let s = MasterLogic::load_file(&mut pool, scope, &expand_tilde(file))?;
            success(format!(
                "Loaded {} staff, {} contracts, {} assignments, {} punch configs, {} work-time patterns, {} overtime patterns",
                s.staff,
                s.contracts,
                s.assignments,
                s.time_punch_configs,
                s.work_time_patterns,
                s.overtime_patterns
            ));
        }
    }

    Ok(())
}
