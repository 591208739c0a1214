use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMethod {
    Floor,
    Ceil,
    #[default]
    Round,
}

impl RoundingMethod {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RoundingMethod::Floor => "floor",
            RoundingMethod::Ceil => "ceil",
            RoundingMethod::Round => "round",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "floor" => Some(RoundingMethod::Floor),
            "ceil" => Some(RoundingMethod::Ceil),
            "round" => Some(RoundingMethod::Round),
            _ => None,
        }
    }
}

/// Unit (minutes) + method. A unit of 0 or 1 only truncates seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundingRule {
    pub unit: u32,
    pub method: RoundingMethod,
}

impl Default for RoundingRule {
    fn default() -> Self {
        Self {
            unit: 1,
            method: RoundingMethod::Round,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PunchMethod {
    #[default]
    Punch,
    Manual,
}

impl PunchMethod {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PunchMethod::Punch => "punch",
            PunchMethod::Manual => "manual",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "punch" => Some(PunchMethod::Punch),
            "manual" => Some(PunchMethod::Manual),
            _ => None,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimePunchConfig {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub start: RoundingRule,
    #[serde(default)]
    pub end: RoundingRule,
    #[serde(default = "default_true")]
    pub break_input: bool,
    #[serde(default)]
    pub break_start: RoundingRule,
    #[serde(default)]
    pub break_end: RoundingRule,
    #[serde(default)]
    pub punch_method: PunchMethod,
    #[serde(default)]
    pub location_info: bool,
}
