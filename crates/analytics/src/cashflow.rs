//! Monthly cash-flow views over bank transactions.

use chrono::NaiveDate;
use core_types::BankTransaction;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How bank transactions are classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashflowRules {
    /// Inflows initiated before this date are not counted as income.
    pub income_since: NaiveDate,
    /// Substring identifying payroll debits.
    pub payroll_marker: String,
    /// Exact description of payouts from the billing platform.
    pub billing_payout_marker: String,
}

/// An amount summed over one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyAmount {
    pub month: NaiveDate,
    pub amount: Decimal,
}

/// Groups `(month, amount)` pairs and returns the sums, most recent month first.
fn sum_by_month(items: impl Iterator<Item = (NaiveDate, Decimal)>) -> Vec<MonthlyAmount> {
    let mut sums: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for (month, amount) in items {
        *sums.entry(month).or_default() += amount;
    }
    sums.into_iter()
        .rev()
        .map(|(month, amount)| MonthlyAmount { month, amount })
        .collect()
}

/// Money entering the account per month, counting only transactions initiated
/// on or after `since`. Earlier inflows include fundraising and are ignored.
pub fn monthly_income(transactions: &[BankTransaction], since: NaiveDate) -> Vec<MonthlyAmount> {
    sum_by_month(
        transactions
            .iter()
            .filter(|tx| tx.is_income() && tx.initiated_at_date >= since)
            .map(|tx| (tx.month, tx.amount)),
    )
}

/// Money leaving the account per month (gross burn), as positive amounts.
pub fn monthly_expenses(transactions: &[BankTransaction]) -> Vec<MonthlyAmount> {
    sum_by_month(
        transactions
            .iter()
            .filter(|tx| !tx.is_income())
            .map(|tx| (tx.month, -tx.amount)),
    )
}

/// Expenses whose description contains `marker` (the payroll provider), as
/// positive amounts per month.
pub fn monthly_payroll(transactions: &[BankTransaction], marker: &str) -> Vec<MonthlyAmount> {
    sum_by_month(
        transactions
            .iter()
            .filter(|tx| !tx.is_income() && tx.description.contains(marker))
            .map(|tx| (tx.month, -tx.amount)),
    )
}

/// Incoming payouts from the billing platform, identified by an exact description.
pub fn billing_payouts<'a>(transactions: &'a [BankTransaction], marker: &str) -> Vec<&'a BankTransaction> {
    transactions
        .iter()
        .filter(|tx| tx.is_income() && tx.description == marker)
        .collect()
}
