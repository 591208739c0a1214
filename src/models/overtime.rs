//! Overtime calculation regimes.
//!
//! Storage keeps the historical flat layout (one discriminator plus a column
//! per knob, most of them only meaningful for one regime). In memory the
//! pattern is an [`OvertimePolicy`] tagged union, so each regime carries
//! exactly the fields it reads and the calculators can `match` on it.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HourMinute {
    pub hours: i64,
    #[serde(default)]
    pub minutes: i64,
}

impl HourMinute {
    pub const fn new(hours: i64, minutes: i64) -> Self {
        Self { hours, minutes }
    }

    pub fn total_minutes(&self) -> i64 {
        self.hours * 60 + self.minutes
    }
}

/// Statutory reference time for a month, keyed by its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardHours {
    pub days_28: HourMinute,
    pub days_29: HourMinute,
    pub days_30: HourMinute,
    pub days_31: HourMinute,
}

impl Default for StandardHours {
    fn default() -> Self {
        Self {
            days_28: HourMinute::new(160, 0),
            days_29: HourMinute::new(165, 42),
            days_30: HourMinute::new(171, 25),
            days_31: HourMinute::new(177, 8),
        }
    }
}

impl StandardHours {
    pub fn for_month_length(&self, days_in_month: u32) -> HourMinute {
        match days_in_month {
            28 => self.days_28,
            29 => self.days_29,
            30 => self.days_30,
            _ => self.days_31,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "calculation_type", rename_all = "snake_case")]
pub enum OvertimePolicy {
    /// Daily threshold produces overtime; optional monthly threshold turns
    /// overtime beyond it into premium.
    Premium {
        #[serde(default)]
        daily_threshold: Option<HourMinute>,
        #[serde(default)]
        monthly_threshold_hours: Option<i64>,
    },
    /// Monthly band: below `min_hours` is deducted, above `max_hours` is
    /// premium. A bound `<= 0` disables that side.
    MonthlyRange { min_hours: i64, max_hours: i64 },
    /// One-month variable working hours.
    Variable {
        #[serde(default)]
        daily_threshold: Option<HourMinute>,
        #[serde(default)]
        monthly_threshold_hours: Option<i64>,
        #[serde(default)]
        standard: StandardHours,
    },
    /// One-month flextime; overtime only exists at month level.
    Flextime {
        #[serde(default)]
        monthly_threshold_hours: Option<i64>,
        #[serde(default)]
        standard: StandardHours,
    },
}

impl OvertimePolicy {
    pub fn type_str(&self) -> &'static str {
        match self {
            OvertimePolicy::Premium { .. } => "premium",
            OvertimePolicy::MonthlyRange { .. } => "monthly_range",
            OvertimePolicy::Variable { .. } => "variable",
            OvertimePolicy::Flextime { .. } => "flextime",
        }
    }

    /// Threshold in minutes above which a single day produces overtime.
    pub fn daily_threshold_minutes(&self) -> Option<i64> {
        match self {
            OvertimePolicy::Premium {
                daily_threshold, ..
            }
            | OvertimePolicy::Variable {
                daily_threshold, ..
            } => daily_threshold.map(|t| t.total_minutes()),
            OvertimePolicy::MonthlyRange { .. } | OvertimePolicy::Flextime { .. } => None,
        }
    }

    pub fn monthly_threshold_minutes(&self) -> Option<i64> {
        match self {
            OvertimePolicy::Premium {
                monthly_threshold_hours,
                ..
            }
            | OvertimePolicy::Variable {
                monthly_threshold_hours,
                ..
            }
            | OvertimePolicy::Flextime {
                monthly_threshold_hours,
                ..
            } => monthly_threshold_hours.map(|h| h * 60),
            OvertimePolicy::MonthlyRange { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimePattern {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub calculate_midnight_premium: bool,
    #[serde(flatten)]
    pub policy: OvertimePolicy,
}

/// Flat row as stored in `overtime_patterns`.
#[derive(Debug, Clone, Default)]
pub struct OvertimePatternRow {
    pub id: i64,
    pub name: String,
    pub calculation_type: String,
    pub calculate_midnight_premium: bool,
    pub daily_overtime_enabled: bool,
    pub daily_overtime_hours: Option<i64>,
    pub daily_overtime_minutes: Option<i64>,
    pub monthly_overtime_enabled: bool,
    pub monthly_overtime_hours: Option<i64>,
    pub monthly_range_min: Option<i64>,
    pub monthly_range_max: Option<i64>,
    pub days: [(i64, i64); 4],
}

impl TryFrom<OvertimePatternRow> for OvertimePattern {
    type Error = AppError;

    fn try_from(row: OvertimePatternRow) -> Result<Self, Self::Error> {
        let daily_threshold = match (row.daily_overtime_enabled, row.daily_overtime_hours) {
            (true, Some(h)) => Some(HourMinute::new(h, row.daily_overtime_minutes.unwrap_or(0))),
            _ => None,
        };
        let monthly_threshold_hours = if row.monthly_overtime_enabled {
            row.monthly_overtime_hours
        } else {
            None
        };
        let [d28, d29, d30, d31] = row.days;
        let standard = StandardHours {
            days_28: HourMinute::new(d28.0, d28.1),
            days_29: HourMinute::new(d29.0, d29.1),
            days_30: HourMinute::new(d30.0, d30.1),
            days_31: HourMinute::new(d31.0, d31.1),
        };

        let policy = match row.calculation_type.as_str() {
            "premium" => OvertimePolicy::Premium {
                daily_threshold,
                monthly_threshold_hours,
            },
            "monthly_range" => OvertimePolicy::MonthlyRange {
                min_hours: row.monthly_range_min.unwrap_or(0),
                max_hours: row.monthly_range_max.unwrap_or(0),
            },
            "variable" => OvertimePolicy::Variable {
                daily_threshold,
                monthly_threshold_hours,
                standard,
            },
            "flextime" => OvertimePolicy::Flextime {
                monthly_threshold_hours,
                standard,
            },
            other => {
                return Err(AppError::ConstraintViolated(format!(
                    "unknown calculation_type '{other}' on overtime pattern {}",
                    row.id
                )));
            }
        };

        Ok(OvertimePattern {
            id: row.id,
            name: row.name,
            calculate_midnight_premium: row.calculate_midnight_premium,
            policy,
        })
    }
}

impl From<&OvertimePattern> for OvertimePatternRow {
    fn from(p: &OvertimePattern) -> Self {
        let mut row = OvertimePatternRow {
            id: p.id,
            name: p.name.clone(),
            calculation_type: p.policy.type_str().to_string(),
            calculate_midnight_premium: p.calculate_midnight_premium,
            ..Default::default()
        };
        let mut standard = StandardHours::default();

        match &p.policy {
            OvertimePolicy::Premium {
                daily_threshold,
                monthly_threshold_hours,
            } => {
                set_daily(&mut row, *daily_threshold);
                set_monthly(&mut row, *monthly_threshold_hours);
            }
            OvertimePolicy::MonthlyRange {
                min_hours,
                max_hours,
            } => {
                row.monthly_range_min = Some(*min_hours);
                row.monthly_range_max = Some(*max_hours);
            }
            OvertimePolicy::Variable {
                daily_threshold,
                monthly_threshold_hours,
                standard: s,
            } => {
                set_daily(&mut row, *daily_threshold);
                set_monthly(&mut row, *monthly_threshold_hours);
                standard = *s;
            }
            OvertimePolicy::Flextime {
                monthly_threshold_hours,
                standard: s,
            } => {
                set_monthly(&mut row, *monthly_threshold_hours);
                standard = *s;
            }
        }

        row.days = [
            (standard.days_28.hours, standard.days_28.minutes),
            (standard.days_29.hours, standard.days_29.minutes),
            (standard.days_30.hours, standard.days_30.minutes),
            (standard.days_31.hours, standard.days_31.minutes),
        ];
        row
    }
}

fn set_daily(row: &mut OvertimePatternRow, threshold: Option<HourMinute>) {
    if let Some(t) = threshold {
        row.daily_overtime_enabled = true;
        row.daily_overtime_hours = Some(t.hours);
        row.daily_overtime_minutes = Some(t.minutes);
    }
}

fn set_monthly(row: &mut OvertimePatternRow, hours: Option<i64>) {
    if let Some(h) = hours {
        row.monthly_overtime_enabled = true;
        row.monthly_overtime_hours = Some(h);
    }
}
