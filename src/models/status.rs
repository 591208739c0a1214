use serde::{Deserialize, Serialize};

/// Shared lifecycle of Timesheets and Approvals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn code(&self) -> i64 {
        match self {
            ApprovalStatus::Draft => 10,
            ApprovalStatus::Submitted => 20,
            ApprovalStatus::Approved => 30,
            ApprovalStatus::Rejected => 40,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            10 => Some(ApprovalStatus::Draft),
            20 => Some(ApprovalStatus::Submitted),
            30 => Some(ApprovalStatus::Approved),
            40 => Some(ApprovalStatus::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Draft => "draft",
            ApprovalStatus::Submitted => "submitted",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }

    /// Rows in these states freeze the period they cover.
    pub fn is_editable(&self) -> bool {
        matches!(self, ApprovalStatus::Draft | ApprovalStatus::Rejected)
    }
}
