use crate::calendar::first_of_month;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// A user identity as seen by the product-analytics platform.
///
/// Two profiles are the same user when their `distinct_id`s match; the email
/// is carried along but does not take part in equality or hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub distinct_id: String,
    /// `None` until the user completes signup and an email gets attached.
    pub email: Option<String>,
}

impl Profile {
    pub fn new(distinct_id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            distinct_id: distinct_id.into(),
            email,
        }
    }

    /// True once the identity is associated with a known signup.
    pub fn finished_signup(&self) -> bool {
        self.email.is_some()
    }
}

impl PartialEq for Profile {
    fn eq(&self, other: &Self) -> bool {
        self.distinct_id == other.distinct_id
    }
}

impl Eq for Profile {}

impl Hash for Profile {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.distinct_id.hash(state);
    }
}

/// A single posted movement on the company cash account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankTransaction {
    pub id: String,
    pub description: String,
    /// Signed amount in major currency units. Positive values are money in.
    pub amount: Decimal,
    pub currency: String,
    pub initiated_at_date: NaiveDate,
    pub posted_at_date: NaiveDate,
    /// First day of the month the transaction was posted in.
    pub month: NaiveDate,
}

impl BankTransaction {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        amount: Decimal,
        currency: impl Into<String>,
        initiated_at_date: NaiveDate,
        posted_at_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            amount,
            currency: currency.into(),
            initiated_at_date,
            posted_at_date,
            month: first_of_month(posted_at_date),
        }
    }

    pub fn is_income(&self) -> bool {
        self.amount >= Decimal::ZERO
    }
}

/// A periodic statement of the cash account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountStatement {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_balance: Decimal,
    pub end_balance: Decimal,
    /// Net burn over the statement period, rounded to whole units.
    pub burn: Decimal,
}

impl AccountStatement {
    pub fn new(
        id: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        start_balance: Decimal,
        end_balance: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            start_date,
            end_date,
            start_balance,
            end_balance,
            burn: (start_balance - end_balance).round(),
        }
    }
}

/// A subscription on the billing platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub start_date: DateTime<Utc>,
    /// `None` while the subscription is still running.
    pub end_date: Option<DateTime<Utc>>,
    /// Monthly plan amount in major currency units.
    pub amount: Decimal,
}

impl Subscription {
    /// `start < t` and the subscription either has not ended or ended at/after `t`.
    pub fn is_active_at(&self, t: DateTime<Utc>) -> bool {
        self.start_date < t && self.end_date.is_none_or(|end| end >= t)
    }
}

/// A customer invoiced directly rather than through the billing platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectCustomer {
    pub name: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub monthly_amount: Decimal,
}

impl DirectCustomer {
    /// Direct contracts always carry an end date, so there is no open-ended case.
    pub fn is_active_at(&self, t: DateTime<Utc>) -> bool {
        self.start_date < t && self.end_date >= t
    }
}
