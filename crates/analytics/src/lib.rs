//! # Pulse Analytics
//!
//! The calculation core of the metrics pipeline: cohort retention, signup
//! funnels, recurring revenue snapshots, cash-flow aggregation and the
//! runway / default-alive simulation.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of external systems.
//!   It depends only on `core-types` (Layer 0). Collectors and the warehouse hand it
//!   plain records and it hands back plain report structs.
//! - **Explicit "now":** Every function that depends on the current time takes it as
//!   an argument, which keeps the models deterministic under test.
//!
//! ## Public API
//!
//! - `Cohort`, `RetentionMatrix`, `signup_funnel`: the monthly cohort model.
//! - `revenue_series`, `PeriodicFinancialSnapshot`: recurring revenue over time.
//! - `monthly_income`, `monthly_expenses`, `monthly_payroll`: bank cash-flow views.
//! - `simulate_default_alive`, `RunwayEstimate`, `assess_runway`: runway model.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod cashflow;
pub mod cohort;
pub mod error;
pub mod report;
pub mod revenue;
pub mod runway;
pub mod stats;

// Re-export the key components to create a clean, public-facing API.
pub use cashflow::{billing_payouts, CashflowRules, monthly_expenses, monthly_income, monthly_payroll, MonthlyAmount};
pub use cohort::{signup_funnel, Cohort, RetentionMatrix};
pub use error::AnalyticsError;
pub use report::{
    PeriodicFinancialSnapshot, RetentionRow, RunwayAssumptions, RunwayReport, SignupFunnelRow,
};
pub use revenue::{current_direct_customers, revenue_series, sample_times, snapshot_at};
pub use runway::{
    assess_runway, runway_string, simulate_default_alive, DefaultAliveOutcome, Runway, RunwayEstimate,
};
pub use stats::Summary;
