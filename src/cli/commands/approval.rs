use std::str::FromStr;

use chrono::Local;

use crate::cli::commands::open_pool;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::approval::ApprovalLogic;
use crate::errors::AppResult;
use crate::models::{Approval, Scope, YearMonth};
use crate::ui::messages::{info, success};
use crate::utils::colors::{color_for_status, paint};

fn describe(a: &Approval) -> String {
    format!(
        "approval #{} contract {} {}..{} [{}]",
        a.id,
        a.staff_contract_id,
        a.period_start.format("%Y-%m-%d"),
        a.period_end.format("%Y-%m-%d"),
        paint(color_for_status(a.status), a.status.as_str())
    )
}

pub fn handle(cmd: &Commands, cfg: &Config, scope: &Scope) -> AppResult<()> {
    let now = Local::now().fixed_offset();
    let mut pool = open_pool(cfg)?;

    match cmd {
        Commands::Submit { staff, month } => {
            let month = YearMonth::from_str(month)?;
            let approvals = ApprovalLogic::submit(&mut pool, scope, *staff, month, now)?;
            success(format!("Submitted {month} for staff {staff}"));
            approvals.iter().for_each(|a| info(describe(a)));
        }

        Commands::Withdraw { staff, month } => {
            let month = YearMonth::from_str(month)?;
            let approvals = ApprovalLogic::withdraw(&mut pool, scope, *staff, month)?;
            success(format!("Withdrawn {month} for staff {staff}"));
            approvals.iter().for_each(|a| info(describe(a)));
        }

        Commands::Approve { id } => {
            let (approval, report) = ApprovalLogic::approve(&mut pool, scope, *id, now)?;
            success(describe(&approval));
            info(format!(
                "Synced {} staff timecards, {} client timecards ({} open records skipped)",
                report.staff_cards, report.client_cards, report.skipped_open
            ));
        }

        Commands::Reject { id, reason } => {
            let approval = ApprovalLogic::reject(&mut pool, scope, *id, reason, now)?;
            success(describe(&approval));
        }

        _ => {}
    }

    Ok(())
}
