//! Monthly folding and the regime-specific adjustment.

use rust_decimal::Decimal;

use crate::models::{MonthlyTotals, OvertimePattern, OvertimePolicy, Timecard, WorkType};

/// Plain sums over the day rows of one month.
pub fn fold_days(cards: &[Timecard]) -> MonthlyTotals {
    cards.iter().fold(MonthlyTotals::default(), |mut t, card| {
        match card.work_type {
            WorkType::Work => t.work_days += 1,
            WorkType::Absence => t.absence_days += 1,
            _ => {}
        }
        t.paid_leave_days += card.paid_leave_days;
        t.work_minutes += card.counters.work_minutes;
        t.overtime_minutes += card.counters.overtime_minutes;
        t.late_night_minutes += card.counters.late_night_minutes;
        t.holiday_work_minutes += card.counters.holiday_work_minutes;
        t
    })
}

/// Reset premium/deduction/variable and recompute them for the regime.
pub fn apply_regime(totals: &mut MonthlyTotals, policy: &OvertimePolicy, days_in_month: u32) {
    totals.premium_minutes = 0;
    totals.deduction_minutes = 0;
    totals.variable_minutes = 0;

    let threshold = policy.monthly_threshold_minutes();

    match policy {
        OvertimePolicy::MonthlyRange {
            min_hours,
            max_hours,
        } => {
            if *min_hours > 0 {
                totals.deduction_minutes = (min_hours * 60 - totals.work_minutes).max(0);
            }
            if *max_hours > 0 {
                totals.premium_minutes = (totals.work_minutes - max_hours * 60).max(0);
            }
        }
        OvertimePolicy::Premium { .. } => {
            if let Some(t) = threshold {
                totals.premium_minutes = (totals.overtime_minutes - t).max(0);
            }
        }
        OvertimePolicy::Variable { standard, .. } => {
            let standard = standard.for_month_length(days_in_month).total_minutes();
            let actual = totals.work_minutes - totals.overtime_minutes;
            totals.variable_minutes = (actual - standard).max(0);
            if let Some(t) = threshold {
                totals.premium_minutes =
                    (totals.overtime_minutes + totals.variable_minutes - t).max(0);
            }
        }
        OvertimePolicy::Flextime { standard, .. } => {
            let standard = standard.for_month_length(days_in_month).total_minutes();
            if totals.work_minutes < standard {
                totals.deduction_minutes = standard - totals.work_minutes;
            }
            totals.overtime_minutes = (totals.work_minutes - standard).max(0);
            if let Some(t) = threshold {
                totals.premium_minutes = (totals.overtime_minutes - t).max(0);
            }
        }
    }
}

/// Fold plus adjustment. Pure, so recomputing twice gives the same totals.
pub fn compute_monthly(
    cards: &[Timecard],
    pattern: Option<&OvertimePattern>,
    days_in_month: u32,
) -> MonthlyTotals {
    let mut totals = fold_days(cards);
    if let Some(p) = pattern {
        apply_regime(&mut totals, &p.policy, days_in_month);
    }
    totals.paid_leave_days = totals.paid_leave_days.normalize();
    totals
}

/// Paid-leave values accepted on a day row.
pub fn is_valid_paid_leave(days: Decimal) -> bool {
    days == Decimal::ZERO || days == Decimal::new(5, 1) || days == Decimal::ONE
}
