use chrono::NaiveDate;
use serde::Serialize;

use super::status::ApprovalStatus;
use super::timerecord::Timestamp;

/// Submitted batch of Timerecords of one staff contract for one closing period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Approval {
    pub id: i64,
    pub staff_id: i64,
    pub staff_contract_id: i64,
    pub closing_date: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub status: ApprovalStatus,
    pub submitted_at: Option<Timestamp>,
    pub submitted_by: Option<String>,
    pub approved_at: Option<Timestamp>,
    pub approved_by: Option<String>,
    pub rejected_at: Option<Timestamp>,
    pub rejected_by: Option<String>,
    pub rejection_reason: Option<String>,
}

impl Approval {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.period_start <= date && date <= self.period_end
    }
}
