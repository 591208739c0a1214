use serde::{Deserialize, Serialize};

use super::timerecord::Timestamp;
use crate::errors::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Uploaded,
    Processing,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TaskStatus::Uploaded => "uploaded",
            TaskStatus::Processing => "processing",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "uploaded" => Some(TaskStatus::Uploaded),
            "processing" => Some(TaskStatus::Processing),
            "completed" => Some(TaskStatus::Completed),
            "failed" => Some(TaskStatus::Failed),
            "cancelled" => Some(TaskStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }
}

/// Failure attached to one CSV line (1-based, header included).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub line: usize,
    pub kind: ErrorKind,
    pub message: String,
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportTask {
    pub id: String,
    pub file_path: String,
    pub status: TaskStatus,
    pub progress: i64,
    pub total: i64,
    pub imported_count: i64,
    pub errors: Vec<RowError>,
    pub start_time: Option<Timestamp>,
    pub elapsed_seconds: f64,
    pub eta_seconds: Option<f64>,
}

impl ImportTask {
    /// `elapsed / progress * (total - progress)`; unknown before the first row.
    pub fn estimate_eta(elapsed_seconds: f64, progress: i64, total: i64) -> Option<f64> {
        if progress <= 0 {
            return None;
        }
        let remaining = (total - progress).max(0) as f64;
        Some(elapsed_seconds / progress as f64 * remaining)
    }
}
