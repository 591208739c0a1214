pub mod approval;
pub mod contract;
pub mod import;
pub mod overtime;
pub mod scope;
pub mod status;
pub mod time_punch;
pub mod timecard;
pub mod timerecord;
pub mod timesheet;
pub mod work_time;
pub mod work_type;
pub mod year_month;

pub use approval::Approval;
pub use contract::{Assignment, Contract, ContractKind, ContractStatus, Staff};
pub use import::{ImportTask, RowError, TaskStatus};
pub use overtime::{HourMinute, OvertimePattern, OvertimePolicy, StandardHours};
pub use scope::{Actor, Scope};
pub use status::ApprovalStatus;
pub use time_punch::{PunchMethod, RoundingMethod, RoundingRule, TimePunchConfig};
pub use timecard::{CardOwner, DailyCounters, Side, Timecard};
pub use timerecord::{Location, Timerecord, TimerecordBreak, Timestamp};
pub use timesheet::{MonthlyTotals, Timesheet};
pub use work_time::{SlotBreak, WorkTimePattern, WorkTimeSlot};
pub use work_type::WorkType;
pub use year_month::YearMonth;
