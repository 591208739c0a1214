//! Coloured user feedback for the CLI. Diagnostics go through `tracing`.

use std::fmt;

use crate::errors::{AppError, ErrorKind};
use crate::utils::colors::{BLUE, GREEN, RED, RESET, YELLOW};

const BOLD: &str = "\x1b[1m";

fn tagged(color: &str, tag: &str, msg: impl fmt::Display) -> String {
    format!("{color}{BOLD}{tag:<5}{RESET} {msg}")
}

pub fn info<T: fmt::Display>(msg: T) {
    println!("{}", tagged(BLUE, "info", msg));
}

pub fn success<T: fmt::Display>(msg: T) {
    println!("{}", tagged(GREEN, "ok", msg));
}

pub fn warning<T: fmt::Display>(msg: T) {
    println!("{}", tagged(YELLOW, "warn", msg));
}

pub fn error<T: fmt::Display>(msg: T) {
    eprintln!("{}", tagged(RED, "error", msg));
}

/// Error line prefixed with the domain kind, e.g. `[locked_period]`.
pub fn failure(err: &AppError) {
    let kind = match err.kind() {
        ErrorKind::OutOfPeriod => "out_of_period",
        ErrorKind::InvalidState => "invalid_state",
        ErrorKind::LockedPeriod => "locked_period",
        ErrorKind::ConstraintViolated => "constraint_violated",
        ErrorKind::NotFound => "not_found",
        ErrorKind::Infrastructure => "infrastructure",
    };
    error(format!("[{kind}] {err}"));
}

pub fn header<T: fmt::Display>(msg: T) {
    println!("{BLUE}{BOLD}== {msg} =={RESET}\n");
}
