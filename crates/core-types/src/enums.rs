use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether revenue figures are reported per month or annualized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RevenueGranularity {
    /// Monthly recurring revenue.
    #[default]
    Mrr,
    /// Annual recurring revenue, i.e. MRR x 12.
    Arr,
}

impl RevenueGranularity {
    /// The factor applied to every monthly revenue figure.
    pub fn multiplier(&self) -> Decimal {
        match self {
            RevenueGranularity::Mrr => Decimal::ONE,
            RevenueGranularity::Arr => Decimal::from(12),
        }
    }
}

impl fmt::Display for RevenueGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevenueGranularity::Mrr => write!(f, "MRR"),
            RevenueGranularity::Arr => write!(f, "ARR"),
        }
    }
}

/// The external data sources the pipeline pulls from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorKind {
    BankTransactions,
    AccountStatements,
    Subscriptions,
    Signups,
}

impl CollectorKind {
    /// The fixed file name used when this collector's output is cached on disk.
    pub fn cache_file_name(&self) -> &'static str {
        match self {
            CollectorKind::BankTransactions => "bank_transactions.json",
            CollectorKind::AccountStatements => "account_statements.json",
            CollectorKind::Subscriptions => "subscriptions.json",
            CollectorKind::Signups => "signups.json",
        }
    }
}

impl fmt::Display for CollectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollectorKind::BankTransactions => "bank transactions",
            CollectorKind::AccountStatements => "account statements",
            CollectorKind::Subscriptions => "subscriptions",
            CollectorKind::Signups => "signups",
        };
        f.write_str(name)
    }
}
