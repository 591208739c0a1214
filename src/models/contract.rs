use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::year_month::YearMonth;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub id: i64,
    pub employee_no: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    Staff,
    Client,
}

impl ContractKind {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ContractKind::Staff => "staff",
            ContractKind::Client => "client",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "staff" => Some(ContractKind::Staff),
            "client" => Some(ContractKind::Client),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    #[default]
    Draft,
    Pending,
    Approved,
    Issued,
    Confirmed,
}

impl ContractStatus {
    pub fn code(&self) -> i64 {
        match self {
            ContractStatus::Draft => 1,
            ContractStatus::Pending => 5,
            ContractStatus::Approved => 10,
            ContractStatus::Issued => 20,
            ContractStatus::Confirmed => 30,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(ContractStatus::Draft),
            5 => Some(ContractStatus::Pending),
            10 => Some(ContractStatus::Approved),
            20 => Some(ContractStatus::Issued),
            30 => Some(ContractStatus::Confirmed),
            _ => None,
        }
    }
}

/// Staff or client contract. Only the attendance-relevant columns are modelled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub id: i64,
    pub kind: ContractKind,
    pub contract_number: String,
    #[serde(default)]
    pub staff_id: Option<i64>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub status: ContractStatus,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub time_punch_id: Option<i64>,
    #[serde(default)]
    pub work_time_pattern_id: Option<i64>,
    #[serde(default)]
    pub overtime_pattern_id: Option<i64>,
}

impl Contract {
    /// `start_date <= date <= end_date`, an absent end date being open-ended.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && self.end_date.is_none_or(|end| date <= end)
    }

    /// Intersection of the contract with the given month, if any.
    pub fn overlap(&self, month: YearMonth) -> Option<(NaiveDate, NaiveDate)> {
        let from = self.start_date.max(month.first_day());
        let to = match self.end_date {
            Some(end) => end.min(month.last_day()),
            None => month.last_day(),
        };
        (from <= to).then_some((from, to))
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == ContractStatus::Confirmed
    }
}

/// Time-bounded link from a staff contract to a client contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub staff_contract_id: i64,
    pub client_contract_id: i64,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

impl Assignment {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && self.end_date.is_none_or(|end| date <= end)
    }
}
