//! Conversions between the domain records and warehouse row sets, and the
//! tables each record type lives in.

use crate::error::DbError;
use crate::table::{Cell, ColumnType, RowSet, RowView, WarehouseTarget};
use analytics::SignupFunnelRow;
use configuration::WarehouseSettings;
use core_types::{AccountStatement, BankTransaction, CollectorKind, DirectCustomer, Subscription};

/// A record type that maps onto one flat warehouse table.
pub trait TableRecord: Sized {
    /// Column names and types, in the order `to_cells` produces them.
    const COLUMNS: &'static [(&'static str, ColumnType)];

    fn to_cells(&self) -> Vec<Cell>;

    fn from_row(row: RowView<'_>) -> Result<Self, DbError>;
}

pub fn to_row_set<R: TableRecord>(records: &[R]) -> Result<RowSet, DbError> {
    let columns = R::COLUMNS.iter().map(|(name, _)| name.to_string()).collect();
    RowSet::new(columns, records.iter().map(TableRecord::to_cells).collect())
}

pub fn from_row_set<R: TableRecord>(set: &RowSet) -> Result<Vec<R>, DbError> {
    set.iter().map(R::from_row).collect()
}

/// The table a collector's output is written to.
pub fn collector_target(settings: &WarehouseSettings, kind: CollectorKind) -> WarehouseTarget {
    let (schema, table) = match kind {
        CollectorKind::BankTransactions => ("BREX", "TRANSACTION_DATA"),
        CollectorKind::AccountStatements => ("BREX", "ACCOUNT_DATA"),
        CollectorKind::Subscriptions => ("STRIPE", "SUBSCRIPTIONS"),
        CollectorKind::Signups => ("MIXPANEL", "SIGNUPS"),
    };
    WarehouseTarget::new(&settings.name, &settings.database, schema, table)
}

/// The hand-maintained table of directly invoiced customers.
pub fn direct_customers_target(settings: &WarehouseSettings) -> WarehouseTarget {
    WarehouseTarget::new(&settings.name, &settings.database, "TEAMS", "CUSTOMERS")
}

impl TableRecord for BankTransaction {
    const COLUMNS: &'static [(&'static str, ColumnType)] = &[
        ("id", ColumnType::Text),
        ("description", ColumnType::Text),
        ("amount", ColumnType::Numeric),
        ("currency", ColumnType::Text),
        ("initiated_at_date", ColumnType::Date),
        ("posted_at_date", ColumnType::Date),
        ("month", ColumnType::Date),
    ];

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.id.clone()),
            Cell::Text(self.description.clone()),
            Cell::Decimal(self.amount),
            Cell::Text(self.currency.clone()),
            Cell::Date(self.initiated_at_date),
            Cell::Date(self.posted_at_date),
            Cell::Date(self.month),
        ]
    }

    // `month` is derived again rather than trusted from the table.
    fn from_row(row: RowView<'_>) -> Result<Self, DbError> {
        Ok(BankTransaction::new(
            row.text("id")?,
            row.text("description")?,
            row.decimal("amount")?,
            row.text("currency")?,
            row.date("initiated_at_date")?,
            row.date("posted_at_date")?,
        ))
    }
}

impl TableRecord for AccountStatement {
    const COLUMNS: &'static [(&'static str, ColumnType)] = &[
        ("id", ColumnType::Text),
        ("start_date", ColumnType::Date),
        ("end_date", ColumnType::Date),
        ("start_balance", ColumnType::Numeric),
        ("end_balance", ColumnType::Numeric),
        ("burn", ColumnType::Numeric),
    ];

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.id.clone()),
            Cell::Date(self.start_date),
            Cell::Date(self.end_date),
            Cell::Decimal(self.start_balance),
            Cell::Decimal(self.end_balance),
            Cell::Decimal(self.burn),
        ]
    }

    fn from_row(row: RowView<'_>) -> Result<Self, DbError> {
        Ok(AccountStatement::new(
            row.text("id")?,
            row.date("start_date")?,
            row.date("end_date")?,
            row.decimal("start_balance")?,
            row.decimal("end_balance")?,
        ))
    }
}

impl TableRecord for Subscription {
    const COLUMNS: &'static [(&'static str, ColumnType)] = &[
        ("id", ColumnType::Text),
        ("start_date", ColumnType::TimestampTz),
        ("end_date", ColumnType::TimestampTz),
        ("amount", ColumnType::Numeric),
    ];

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.id.clone()),
            Cell::Timestamp(self.start_date),
            Cell::from(self.end_date),
            Cell::Decimal(self.amount),
        ]
    }

    fn from_row(row: RowView<'_>) -> Result<Self, DbError> {
        Ok(Subscription {
            id: row.text("id")?,
            start_date: row.timestamp("start_date")?,
            end_date: row.optional_timestamp("end_date")?,
            amount: row.decimal("amount")?,
        })
    }
}

impl TableRecord for DirectCustomer {
    const COLUMNS: &'static [(&'static str, ColumnType)] = &[
        ("name", ColumnType::Text),
        ("start_date", ColumnType::TimestampTz),
        ("end_date", ColumnType::TimestampTz),
        ("monthly_amount", ColumnType::Numeric),
    ];

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            Cell::Text(self.name.clone()),
            Cell::Timestamp(self.start_date),
            Cell::Timestamp(self.end_date),
            Cell::Decimal(self.monthly_amount),
        ]
    }

    fn from_row(row: RowView<'_>) -> Result<Self, DbError> {
        Ok(DirectCustomer {
            name: row.text("name")?,
            start_date: row.timestamp("start_date")?,
            end_date: row.timestamp("end_date")?,
            monthly_amount: row.decimal("monthly_amount")?,
        })
    }
}

impl TableRecord for SignupFunnelRow {
    const COLUMNS: &'static [(&'static str, ColumnType)] = &[
        ("month", ColumnType::Date),
        ("num_finished_signup", ColumnType::BigInt),
        ("num_started_signup", ColumnType::BigInt),
        ("finished_ratio", ColumnType::Numeric),
    ];

    fn to_cells(&self) -> Vec<Cell> {
        vec![
            Cell::Date(self.month),
            Cell::Int(i64::try_from(self.num_finished_signup).unwrap_or(i64::MAX)),
            Cell::Int(i64::try_from(self.num_started_signup).unwrap_or(i64::MAX)),
            Cell::from(self.finished_ratio),
        ]
    }

    fn from_row(row: RowView<'_>) -> Result<Self, DbError> {
        let count = |column: &str| -> Result<u64, DbError> {
            u64::try_from(row.integer(column)?)
                .map_err(|_| DbError::RowConversion(format!("column '{column}' is negative")))
        };

        Ok(SignupFunnelRow {
            month: row.date("month")?,
            num_finished_signup: count("num_finished_signup")?,
            num_started_signup: count("num_started_signup")?,
            finished_ratio: row.optional_decimal("finished_ratio")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn open_subscription_is_written_as_null_end_date() {
        let subs = vec![Subscription {
            id: "sub_1".into(),
            start_date: Utc.with_ymd_and_hms(2023, 1, 5, 0, 0, 0).unwrap(),
            end_date: None,
            amount: dec!(49),
        }];

        let set = to_row_set(&subs).unwrap();
        assert_eq!(set.columns(), ["id", "start_date", "end_date", "amount"]);
        assert_eq!(set.rows()[0][2], Cell::Null);

        let back: Vec<Subscription> = from_row_set(&set).unwrap();
        assert_eq!(back, subs);
    }

    #[test]
    fn transactions_read_back_with_upper_case_columns() {
        // Warehouses that preserve case hand back upper-case column names.
        let set = RowSet::new(
            vec![
                "ID".into(),
                "DESCRIPTION".into(),
                "AMOUNT".into(),
                "CURRENCY".into(),
                "INITIATED_AT_DATE".into(),
                "POSTED_AT_DATE".into(),
                "MONTH".into(),
            ],
            vec![vec![
                Cell::Text("tx".into()),
                Cell::Text("AWS".into()),
                Cell::Decimal(dec!(-12.5)),
                Cell::Text("USD".into()),
                Cell::Date(day(2023, 3, 30)),
                Cell::Date(day(2023, 4, 2)),
                Cell::Date(day(2023, 4, 1)),
            ]],
        )
        .unwrap();

        let txs: Vec<BankTransaction> = from_row_set(&set).unwrap();
        assert_eq!(txs[0].month, day(2023, 4, 1));
        assert_eq!(txs[0].amount, dec!(-12.5));
    }

    #[test]
    fn funnel_rows_keep_null_ratio() {
        let rows = vec![SignupFunnelRow {
            month: day(2022, 1, 1),
            num_finished_signup: 0,
            num_started_signup: 0,
            finished_ratio: None,
        }];

        let back: Vec<SignupFunnelRow> = from_row_set(&to_row_set(&rows).unwrap()).unwrap();
        assert_eq!(back, rows);
    }

    #[test]
    fn statement_burn_is_recomputed_on_read() {
        let statement = AccountStatement::new("st", day(2023, 1, 1), day(2023, 1, 31), dec!(100), dec!(40.4));
        let back: Vec<AccountStatement> = from_row_set(&to_row_set(&[statement.clone()]).unwrap()).unwrap();
        assert_eq!(back[0].burn, dec!(60));
    }

    #[test]
    fn collector_tables() {
        let settings = WarehouseSettings::default();
        let target = collector_target(&settings, CollectorKind::Signups);
        assert_eq!(target.qualified_name().unwrap(), "mixpanel.signups");
        assert_eq!(direct_customers_target(&settings).qualified_name().unwrap(), "teams.customers");
    }
}
