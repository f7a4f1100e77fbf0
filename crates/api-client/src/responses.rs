use crate::error::ApiError;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_types::{AccountStatement, BankTransaction, Profile, Subscription};
use rust_decimal::Decimal;
use serde::Deserialize;

// Raw response shapes of the three collectors. Only the fields we use are
// declared; serde ignores the rest.

/// A money value in minor units, as the banking API reports it.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMoney {
    pub amount: i64,
    pub currency: Option<String>,
}

impl RawMoney {
    pub fn to_major_units(&self) -> Decimal {
        Decimal::new(self.amount, 2)
    }
}

/// `GET /transactions/cash/{account}` and `GET /accounts/cash/{account}/statements`.
#[derive(Debug, Clone, Deserialize)]
pub struct CursorPageResponse<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawBankTransaction {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub amount: RawMoney,
    pub initiated_at_date: NaiveDate,
    pub posted_at_date: NaiveDate,
}

impl From<RawBankTransaction> for BankTransaction {
    fn from(raw: RawBankTransaction) -> Self {
        let amount = raw.amount.to_major_units();
        BankTransaction::new(
            raw.id,
            raw.description,
            amount,
            raw.amount.currency.unwrap_or_else(|| "USD".to_string()),
            raw.initiated_at_date,
            raw.posted_at_date,
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStatement {
    pub id: String,
    pub start_balance: RawMoney,
    pub end_balance: RawMoney,
    pub period: RawPeriod,
}

impl From<RawStatement> for AccountStatement {
    fn from(raw: RawStatement) -> Self {
        AccountStatement::new(
            raw.id,
            raw.period.start_date,
            raw.period.end_date,
            raw.start_balance.to_major_units(),
            raw.end_balance.to_major_units(),
        )
    }
}

/// `GET /subscriptions`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionListResponse {
    pub data: Vec<RawSubscription>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSubscription {
    pub id: String,
    /// Unix seconds.
    pub start_date: i64,
    pub ended_at: Option<i64>,
    pub plan: Option<RawPlan>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPlan {
    /// Minor units. Absent for tiered pricing.
    pub amount: Option<i64>,
}

fn from_unix(seconds: i64, field: &str, id: &str) -> Result<DateTime<Utc>, ApiError> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| ApiError::InvalidData(format!("subscription {id}: invalid {field} {seconds}")))
}

impl TryFrom<RawSubscription> for Subscription {
    type Error = ApiError;

    fn try_from(raw: RawSubscription) -> Result<Self, Self::Error> {
        let cents = raw
            .plan
            .as_ref()
            .and_then(|p| p.amount)
            .ok_or_else(|| ApiError::InvalidData(format!("subscription {} has no plan amount", raw.id)))?;

        Ok(Subscription {
            start_date: from_unix(raw.start_date, "start_date", &raw.id)?,
            end_date: raw
                .ended_at
                .map(|t| from_unix(t, "ended_at", &raw.id))
                .transpose()?,
            amount: Decimal::new(cents, 2),
            id: raw.id,
        })
    }
}

/// `POST /engage`.
#[derive(Debug, Clone, Deserialize)]
pub struct EngageResponse {
    pub results: Vec<RawProfile>,
    pub total: usize,
    pub page: u32,
    pub session_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawProfile {
    #[serde(rename = "$distinct_id")]
    pub distinct_id: String,
    #[serde(rename = "$properties", default)]
    pub properties: RawProfileProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProfileProperties {
    #[serde(rename = "$email")]
    pub email: Option<String>,
}

impl From<RawProfile> for Profile {
    fn from(raw: RawProfile) -> Self {
        Profile::new(raw.distinct_id, raw.properties.email)
    }
}

/// The error envelope the billing platform wraps failures in.
#[derive(Debug, Clone, Deserialize)]
pub struct BillingErrorResponse {
    pub error: BillingErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BillingErrorBody {
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn bank_transaction_amounts_are_converted_from_cents() {
        let page: CursorPageResponse<RawBankTransaction> = serde_json::from_str(
            r#"{
                "items": [{
                    "id": "tx_1",
                    "description": "RIPPLING PAYROLL",
                    "amount": {"amount": -912345, "currency": "USD"},
                    "initiated_at_date": "2023-03-30",
                    "posted_at_date": "2023-04-01",
                    "type": "ACH"
                }],
                "next_cursor": "abc"
            }"#,
        )
        .unwrap();

        assert_eq!(page.next_cursor.as_deref(), Some("abc"));
        let tx: BankTransaction = page.items.into_iter().next().unwrap().into();
        assert_eq!(tx.amount, dec!(-9123.45));
        assert_eq!(tx.month, NaiveDate::from_ymd_opt(2023, 4, 1).unwrap());
        assert!(!tx.is_income());
    }

    #[test]
    fn missing_next_cursor_ends_the_listing() {
        let page: CursorPageResponse<RawStatement> = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn statement_burn_is_derived() {
        let raw: RawStatement = serde_json::from_str(
            r#"{
                "id": "st_1",
                "start_balance": {"amount": 10000000, "currency": "USD"},
                "end_balance": {"amount": 9000050, "currency": "USD"},
                "period": {"start_date": "2023-01-01", "end_date": "2023-01-31"}
            }"#,
        )
        .unwrap();

        let statement = AccountStatement::from(raw);
        assert_eq!(statement.start_balance, dec!(100000));
        assert_eq!(statement.burn, dec!(10000));
    }

    #[test]
    fn subscription_without_end_is_open() {
        let raw: RawSubscription = serde_json::from_str(
            r#"{"id": "sub_1", "start_date": 1672531200, "ended_at": null, "plan": {"amount": 4900}}"#,
        )
        .unwrap();

        let sub = Subscription::try_from(raw).unwrap();
        assert_eq!(sub.amount, dec!(49));
        assert!(sub.end_date.is_none());
        assert_eq!(sub.start_date, Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn subscription_without_plan_amount_is_invalid() {
        let raw: RawSubscription =
            serde_json::from_str(r#"{"id": "sub_2", "start_date": 1672531200, "ended_at": null, "plan": {"amount": null}}"#)
                .unwrap();
        assert!(matches!(Subscription::try_from(raw), Err(ApiError::InvalidData(_))));
    }

    #[test]
    fn engage_profiles_keep_optional_email() {
        let response: EngageResponse = serde_json::from_str(
            r#"{
                "page": 0, "page_size": 1000, "session_id": "s1", "status": "ok", "total": 2,
                "results": [
                    {"$distinct_id": "u1", "$properties": {"$email": "a@example.com"}},
                    {"$distinct_id": "u2", "$properties": {}}
                ]
            }"#,
        )
        .unwrap();

        let profiles: Vec<Profile> = response.results.into_iter().map(Profile::from).collect();
        assert!(profiles[0].finished_signup());
        assert!(!profiles[1].finished_signup());
        assert_eq!(response.total, 2);
    }
}
