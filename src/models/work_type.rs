use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WorkType {
    #[default]
    Work,
    Holiday,
    Absence,
    PaidLeave,
    SpecialLeave,
    CompOff,
    NoWork,
}

impl WorkType {
    /// Convert enum → DB / CSV code
    pub fn code(&self) -> i64 {
        match self {
            WorkType::Work => 10,
            WorkType::Holiday => 20,
            WorkType::Absence => 30,
            WorkType::PaidLeave => 40,
            WorkType::SpecialLeave => 50,
            WorkType::CompOff => 60,
            WorkType::NoWork => 70,
        }
    }

    /// Convert DB / CSV code → enum
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            10 => Some(WorkType::Work),
            20 => Some(WorkType::Holiday),
            30 => Some(WorkType::Absence),
            40 => Some(WorkType::PaidLeave),
            50 => Some(WorkType::SpecialLeave),
            60 => Some(WorkType::CompOff),
            70 => Some(WorkType::NoWork),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkType::Work => "work",
            WorkType::Holiday => "holiday",
            WorkType::Absence => "absence",
            WorkType::PaidLeave => "paid leave",
            WorkType::SpecialLeave => "special leave",
            WorkType::CompOff => "comp. off",
            WorkType::NoWork => "no work",
        }
    }

    pub fn is_work(&self) -> bool {
        matches!(self, WorkType::Work)
    }
}
