use rust_decimal::Decimal;
use serde::Serialize;

use super::status::ApprovalStatus;
use super::timecard::CardOwner;
use super::timerecord::Timestamp;
use super::year_month::YearMonth;

/// Aggregate counters of one month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonthlyTotals {
    pub work_days: i64,
    pub absence_days: i64,
    pub paid_leave_days: Decimal,
    pub work_minutes: i64,
    pub overtime_minutes: i64,
    pub late_night_minutes: i64,
    pub holiday_work_minutes: i64,
    pub premium_minutes: i64,
    pub deduction_minutes: i64,
    pub variable_minutes: i64,
}

/// Monthly aggregate row, staff side or client side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timesheet {
    pub id: i64,
    pub owner: CardOwner,
    pub target_month: YearMonth,
    pub totals: MonthlyTotals,
    pub status: ApprovalStatus,
    pub submitted_at: Option<Timestamp>,
    pub submitted_by: Option<String>,
    pub approved_at: Option<Timestamp>,
    pub approved_by: Option<String>,
    pub rejected_at: Option<Timestamp>,
    pub rejected_by: Option<String>,
    pub rejection_reason: Option<String>,
}

impl Timesheet {
    pub fn new(owner: CardOwner, target_month: YearMonth) -> Self {
        Self {
            id: 0,
            owner,
            target_month,
            totals: MonthlyTotals::default(),
            status: ApprovalStatus::Draft,
            submitted_at: None,
            submitted_by: None,
            approved_at: None,
            approved_by: None,
            rejected_at: None,
            rejected_by: None,
            rejection_reason: None,
        }
    }
}
