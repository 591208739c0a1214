//! ANSI colour helpers for terminal output.

use crate::core::punch::PunchState;
use crate::models::ApprovalStatus;

pub const RESET: &str = "\x1b[0m";
pub const GREY: &str = "\x1b[90m";
pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const BLUE: &str = "\x1b[34m";
pub const MAGENTA: &str = "\x1b[35m";
pub const CYAN: &str = "\x1b[36m";

pub fn paint(color: &str, text: &str) -> String {
    format!("{color}{text}{RESET}")
}

pub fn color_for_status(status: ApprovalStatus) -> &'static str {
    match status {
        ApprovalStatus::Draft => GREY,
        ApprovalStatus::Submitted => YELLOW,
        ApprovalStatus::Approved => GREEN,
        ApprovalStatus::Rejected => RED,
    }
}

pub fn color_for_state(state: PunchState) -> &'static str {
    match state {
        PunchState::NotStarted => GREY,
        PunchState::Working => GREEN,
        PunchState::OnBreak => YELLOW,
        PunchState::Finished => BLUE,
    }
}

/// Colour of an audit log operation.
pub fn color_for_operation(op: &str) -> &'static str {
    match op {
        "migration_applied" | "init" => MAGENTA,
        "master_load" => CYAN,
        op if op.starts_with("punch") => GREEN,
        op if op.starts_with("approval") => YELLOW,
        op if op.ends_with("delete") || op == "import_cancel" => RED,
        op if op.starts_with("import") => BLUE,
        _ => RESET,
    }
}

/// Grey for empty cells (`--:--`, blank), plain otherwise.
pub fn colorize_optional(value: &str) -> String {
    let v = value.trim();
    if v.is_empty() || v == "--:--" || v == "00:00" {
        paint(GREY, value)
    } else {
        value.to_string()
    }
}
