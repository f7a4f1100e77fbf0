use crate::runway::{DefaultAliveOutcome, RunwayEstimate};
use crate::stats::Summary;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One month of the signup funnel: how many first-seen users went on to
/// finish signup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignupFunnelRow {
    pub month: NaiveDate,
    pub num_finished_signup: u64,
    pub num_started_signup: u64,
    /// `None` for a month with no started signups.
    pub finished_ratio: Option<Decimal>,
}

/// One cohort's row of the retention matrix.
///
/// `counts[k]` is the number of the cohort's initial members active in the
/// month `k` months after `start_date`. `None` means that month is not one of
/// the recorded windows (it lies in the future, or the windows have a gap).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionRow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_size: u64,
    pub counts: Vec<Option<u64>>,
}

impl RetentionRow {
    pub fn count_at_offset(&self, offset: usize) -> Option<u64> {
        self.counts.get(offset).copied().flatten()
    }
}

/// Recurring revenue and customer counts at a single instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodicFinancialSnapshot {
    pub time: DateTime<Utc>,
    pub recurring_revenue_from_billing: Decimal,
    pub active_subscription_count: u64,
    pub recurring_revenue_from_direct_customers: Decimal,
    pub active_direct_customer_count: u64,
    pub total_revenue: Decimal,
}

impl PeriodicFinancialSnapshot {
    /// Multiplies every revenue field by `factor`. Counts are left alone.
    pub fn scaled(self, factor: Decimal) -> Self {
        Self {
            recurring_revenue_from_billing: self.recurring_revenue_from_billing * factor,
            recurring_revenue_from_direct_customers: self.recurring_revenue_from_direct_customers
                * factor,
            total_revenue: self.total_revenue * factor,
            ..self
        }
    }
}

/// User-tunable inputs to the runway assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunwayAssumptions {
    /// How many recent months of burn to consider (1..=12).
    pub number_months: usize,
    /// Fractional monthly revenue growth, e.g. 0.25 for 25% per month.
    pub monthly_revenue_growth_rate: Decimal,
    /// Headcount the most recent payroll month is split across.
    pub payroll_headcount: u32,
    /// Yearly salary per head to plan with. Defaults to the current one.
    pub new_yearly_salary: Option<Decimal>,
    /// Cap on the number of simulated months.
    pub max_months: u32,
}

impl Default for RunwayAssumptions {
    fn default() -> Self {
        Self {
            number_months: 1,
            monthly_revenue_growth_rate: Decimal::new(25, 2),
            payroll_headcount: 3,
            new_yearly_salary: None,
            max_months: 1200,
        }
    }
}

/// Everything the runway section of the dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunwayReport {
    /// End balance of the most recent statement.
    pub balance: Decimal,
    pub current_yearly_salary: Option<Decimal>,
    pub salary_adjustment: Decimal,

    pub income: Option<Summary>,
    pub gross_burn: Option<Summary>,
    pub net_burn: Option<Summary>,

    pub worst_case: Option<DefaultAliveOutcome>,
    pub average_case: Option<DefaultAliveOutcome>,
    pub best_case: Option<DefaultAliveOutcome>,

    pub net_runway: Option<[RunwayEstimate; 3]>,
    pub gross_runway: Option<[RunwayEstimate; 3]>,
}
