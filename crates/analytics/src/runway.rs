//! Runway and "default alive" projections.

use crate::cashflow::{monthly_expenses, monthly_income, monthly_payroll, CashflowRules};
use crate::error::AnalyticsError;
use crate::report::{RunwayAssumptions, RunwayReport};
use crate::stats::Summary;
use core_types::{AccountStatement, BankTransaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The result of running the month-by-month cash simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultAliveOutcome {
    /// Revenue overtook expenses after `month` simulated months.
    DefaultAlive { month: u32 },
    /// The balance ran out after `month` simulated months.
    DefaultDead { month: u32 },
    /// Neither happened within the iteration cap.
    DidNotConverge { months: u32 },
}

impl DefaultAliveOutcome {
    pub fn is_default_alive(&self) -> bool {
        matches!(self, DefaultAliveOutcome::DefaultAlive { .. })
    }
}

impl fmt::Display for DefaultAliveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultAliveOutcome::DefaultAlive { month } => write!(f, "default alive (month {month})"),
            DefaultAliveOutcome::DefaultDead { month } => write!(f, "default dead (month {month})"),
            DefaultAliveOutcome::DidNotConverge { months } => {
                write!(f, "undetermined after {months} months")
            }
        }
    }
}

/// Simulates the company's cash month by month.
///
/// Each month: a non-positive balance is fatal; revenue above expenses means
/// the company is default alive; otherwise expenses are paid (a negative
/// balance is fatal), revenue is banked and grows by `monthly_revenue_growth_rate`.
///
/// # Arguments
///
/// * `starting_balance` - Cash on hand.
/// * `monthly_revenue` - Revenue in the first simulated month.
/// * `monthly_expenses` - Expenses, held constant.
/// * `monthly_revenue_growth_rate` - Fractional growth, e.g. `0.25` for 25% per month.
/// * `max_months` - Iteration cap. Inputs such as zero revenue and zero
///   expenses never resolve and report `DidNotConverge`.
pub fn simulate_default_alive(
    starting_balance: Decimal,
    monthly_revenue: Decimal,
    monthly_expenses: Decimal,
    monthly_revenue_growth_rate: Decimal,
    max_months: u32,
) -> DefaultAliveOutcome {
    let growth = Decimal::ONE + monthly_revenue_growth_rate;
    let mut balance = starting_balance;
    let mut revenue = monthly_revenue;

    for month in 0..max_months {
        if balance <= Decimal::ZERO {
            return DefaultAliveOutcome::DefaultDead { month };
        }
        if revenue > monthly_expenses {
            return DefaultAliveOutcome::DefaultAlive { month };
        }

        balance = balance.saturating_sub(monthly_expenses);
        if balance < Decimal::ZERO {
            return DefaultAliveOutcome::DefaultDead { month };
        }

        balance = balance.saturating_add(revenue);
        revenue = revenue.saturating_mul(growth);
    }

    DefaultAliveOutcome::DidNotConverge { months: max_months }
}

/// How long the balance lasts at a given burn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Runway {
    /// The account is not shrinking.
    Infinite,
    /// Whole years, rounded half-to-even.
    Years(Decimal),
}

/// A burn figure together with the runway it implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunwayEstimate {
    /// Monthly burn, rounded to whole units.
    pub burn: Decimal,
    pub runway: Runway,
}

impl RunwayEstimate {
    /// A burn of zero or less (net gain) is an infinite runway.
    pub fn new(balance: Decimal, monthly_burn: Decimal) -> Self {
        let runway = if monthly_burn <= Decimal::ZERO {
            Runway::Infinite
        } else {
            Runway::Years((balance / monthly_burn / Decimal::from(12)).round())
        };
        Self {
            burn: monthly_burn.round(),
            runway,
        }
    }
}

impl fmt::Display for RunwayEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.runway {
            Runway::Infinite => write!(f, "${}, so runway is infinite.", self.burn),
            Runway::Years(years) => write!(f, "${}, for a runway of {} years.", self.burn, years),
        }
    }
}

/// Renders the runway sentence shown on the dashboard.
pub fn runway_string(balance: Decimal, monthly_burn: Decimal) -> String {
    RunwayEstimate::new(balance, monthly_burn).to_string()
}

/// Builds the runway section from raw bank data.
///
/// Burn statistics cover the `number_months` most recent months and include
/// the salary adjustment. Series with no data are reported as `None`.
///
/// # Errors
///
/// `InvalidInput` if `number_months` is outside `1..=12`; `EmptyDataset` if
/// there are no statements to take the balance from.
pub fn assess_runway(
    transactions: &[BankTransaction],
    statements: &[AccountStatement],
    rules: &CashflowRules,
    assumptions: &RunwayAssumptions,
) -> Result<RunwayReport, AnalyticsError> {
    if !(1..=12).contains(&assumptions.number_months) {
        return Err(AnalyticsError::InvalidInput(format!(
            "number_months must be between 1 and 12, got {}",
            assumptions.number_months
        )));
    }

    let mut recent_statements: Vec<&AccountStatement> = statements.iter().collect();
    recent_statements.sort_by(|a, b| b.start_date.cmp(&a.start_date));
    let balance = recent_statements
        .first()
        .map(|s| s.end_balance)
        .ok_or_else(|| AnalyticsError::EmptyDataset("account statements".to_string()))?;

    let current_yearly_salary = monthly_payroll(transactions, &rules.payroll_marker)
        .first()
        .filter(|_| assumptions.payroll_headcount > 0)
        .map(|latest| latest.amount / Decimal::from(assumptions.payroll_headcount) * Decimal::from(12));
    let salary_adjustment = assumptions
        .new_yearly_salary
        .map(|new| (new - current_yearly_salary.unwrap_or_default()) / Decimal::from(12))
        .unwrap_or_default();

    let income: Vec<Decimal> = monthly_income(transactions, rules.income_since)
        .into_iter()
        .map(|m| m.amount)
        .collect();
    let gross: Vec<Decimal> = monthly_expenses(transactions)
        .into_iter()
        .take(assumptions.number_months)
        .map(|m| m.amount)
        .collect();
    let net: Vec<Decimal> = recent_statements
        .iter()
        .take(assumptions.number_months)
        .map(|s| s.burn)
        .collect();

    let income = recover(Summary::of(&income, "recent income"));
    let gross_burn = recover(Summary::of(&gross, "gross burn")).map(|s| s.shifted(salary_adjustment));
    let net_burn = recover(Summary::of(&net, "net burn")).map(|s| s.shifted(salary_adjustment));

    let simulate = |revenue: Decimal, expenses: Decimal| {
        simulate_default_alive(
            balance,
            revenue,
            expenses,
            assumptions.monthly_revenue_growth_rate,
            assumptions.max_months,
        )
    };
    let scenarios = income.zip(gross_burn).map(|(income, gross)| {
        (
            simulate(income.min, gross.max),
            simulate(income.mean, gross.mean),
            simulate(income.max, gross.min),
        )
    });
    let estimates = |s: Summary| [s.min, s.max, s.mean].map(|burn| RunwayEstimate::new(balance, burn));

    tracing::info!(%balance, %salary_adjustment, "Runway assessment complete.");

    Ok(RunwayReport {
        balance,
        current_yearly_salary,
        salary_adjustment,
        income,
        gross_burn,
        net_burn,
        worst_case: scenarios.map(|s| s.0),
        average_case: scenarios.map(|s| s.1),
        best_case: scenarios.map(|s| s.2),
        net_runway: net_burn.map(estimates),
        gross_runway: gross_burn.map(estimates),
    })
}

/// Turns an empty series into an absent figure, logging it.
fn recover(summary: Result<Summary, AnalyticsError>) -> Option<Summary> {
    match summary {
        Ok(summary) => Some(summary),
        Err(e) => {
            tracing::warn!(error = %e, "Reporting figure as unavailable.");
            None
        }
    }
}
