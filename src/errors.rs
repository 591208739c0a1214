//! Unified application error type.
//! All modules (db, core, cli, utils) return AppError to keep the error
//! handling consistent and easy to manage.

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    // ---------------------------
    // Attendance domain
    // ---------------------------
    #[error("Out of contract period: {0}")]
    OutOfPeriod(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Locked period: {0}")]
    LockedPeriod(String),

    #[error("Constraint violated: {0}")]
    ConstraintViolated(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // ---------------------------
    // IO
    // ---------------------------
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    // ---------------------------
    // Database-related
    // ---------------------------
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("Database migration error: {0}")]
    Migration(String),

    // ---------------------------
    // Parsing errors
    // ---------------------------
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ---------------------------
    // Config errors
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // ---------------------------
    // Generic fallback
    // ---------------------------
    #[error("Internal error: {0}")]
    Other(String),
}

/// Coarse classification of an [`AppError`], used by callers that only care
/// about the domain failure and not about the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    OutOfPeriod,
    InvalidState,
    LockedPeriod,
    ConstraintViolated,
    NotFound,
    Infrastructure,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::OutOfPeriod(_) => ErrorKind::OutOfPeriod,
            AppError::InvalidState(_) => ErrorKind::InvalidState,
            AppError::LockedPeriod(_) => ErrorKind::LockedPeriod,
            AppError::ConstraintViolated(_)
            | AppError::InvalidDate(_)
            | AppError::InvalidTime(_) => ErrorKind::ConstraintViolated,
            AppError::NotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::Infrastructure,
        }
    }

    /// Map a UNIQUE violation coming from SQLite to `ConstraintViolated`,
    /// leaving every other database error untouched.
    pub fn from_unique(err: rusqlite::Error, what: &str) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                AppError::ConstraintViolated(format!("duplicate {what}"))
            }
            _ => AppError::Db(err),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
