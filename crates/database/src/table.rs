//! The uniform tabular shape every warehouse read and write goes through.

use crate::error::DbError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::fmt;

/// A fully-qualified warehouse destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseTarget {
    pub warehouse: String,
    pub database: String,
    pub schema: String,
    pub table: String,
}

impl WarehouseTarget {
    pub fn new(
        warehouse: impl Into<String>,
        database: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            warehouse: warehouse.into(),
            database: database.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// `schema.table`, validated so it can be spliced into SQL.
    pub fn qualified_name(&self) -> Result<String, DbError> {
        Ok(format!("{}.{}", identifier(&self.schema)?, identifier(&self.table)?))
    }
}

impl fmt::Display for WarehouseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}.{}.{}", self.warehouse, self.database, self.schema, self.table)
    }
}

/// Validates a schema, table or column name and returns it lower-cased.
///
/// Only ASCII letters, digits and underscores are accepted, and the name may
/// not start with a digit.
pub fn identifier(name: &str) -> Result<String, DbError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid {
        Ok(name.to_ascii_lowercase())
    } else {
        Err(DbError::InvalidIdentifier(name.to_string()))
    }
}

/// The column types tables are created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    BigInt,
    Numeric,
    Text,
    Date,
    TimestampTz,
    Boolean,
}

impl ColumnType {
    pub fn sql(&self) -> &'static str {
        match self {
            ColumnType::BigInt => "BIGINT",
            ColumnType::Numeric => "NUMERIC",
            ColumnType::Text => "TEXT",
            ColumnType::Date => "DATE",
            ColumnType::TimestampTz => "TIMESTAMPTZ",
            ColumnType::Boolean => "BOOLEAN",
        }
    }
}

/// A single value in a row set.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Int(i64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
    Bool(bool),
}

impl Cell {
    fn kind(&self) -> &'static str {
        match self {
            Cell::Null => "null",
            Cell::Int(_) => "integer",
            Cell::Decimal(_) => "decimal",
            Cell::Text(_) => "text",
            Cell::Date(_) => "date",
            Cell::Timestamp(_) => "timestamp",
            Cell::Bool(_) => "boolean",
        }
    }
}

impl From<Option<Decimal>> for Cell {
    fn from(value: Option<Decimal>) -> Self {
        value.map_or(Cell::Null, Cell::Decimal)
    }
}

impl From<Option<DateTime<Utc>>> for Cell {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Cell::Null, Cell::Timestamp)
    }
}

/// A flat table: lower-cased column names and rows of equal width.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RowSet {
    /// # Errors
    ///
    /// `RowConversion` if any row's width differs from the number of columns.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, DbError> {
        let columns: Vec<String> = columns.into_iter().map(|c| c.to_lowercase()).collect();
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != columns.len()) {
            return Err(DbError::RowConversion(format!(
                "row {idx} has {} cells but there are {} columns",
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = RowView<'_>> {
        self.rows.iter().map(|cells| RowView {
            columns: &self.columns,
            cells,
        })
    }
}

/// Name-based access to one row of a [`RowSet`].
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    columns: &'a [String],
    cells: &'a [Cell],
}

impl<'a> RowView<'a> {
    pub fn get(&self, column: &str) -> Result<&'a Cell, DbError> {
        let column = column.to_lowercase();
        self.columns
            .iter()
            .position(|c| *c == column)
            .map(|idx| &self.cells[idx])
            .ok_or_else(|| DbError::RowConversion(format!("missing column '{column}'")))
    }

    fn mismatch(&self, column: &str, expected: &str, found: &Cell) -> DbError {
        DbError::RowConversion(format!(
            "column '{column}': expected {expected}, found {}",
            found.kind()
        ))
    }

    pub fn text(&self, column: &str) -> Result<String, DbError> {
        match self.get(column)? {
            Cell::Text(s) => Ok(s.clone()),
            other => Err(self.mismatch(column, "text", other)),
        }
    }

    pub fn optional_decimal(&self, column: &str) -> Result<Option<Decimal>, DbError> {
        match self.get(column)? {
            Cell::Null => Ok(None),
            Cell::Decimal(d) => Ok(Some(*d)),
            Cell::Int(i) => Ok(Some(Decimal::from(*i))),
            other => Err(self.mismatch(column, "decimal", other)),
        }
    }

    pub fn decimal(&self, column: &str) -> Result<Decimal, DbError> {
        self.optional_decimal(column)?
            .ok_or_else(|| DbError::RowConversion(format!("column '{column}' is null")))
    }

    pub fn integer(&self, column: &str) -> Result<i64, DbError> {
        match self.get(column)? {
            Cell::Int(i) => Ok(*i),
            other => Err(self.mismatch(column, "integer", other)),
        }
    }

    /// Accepts a date, or a timestamp truncated to its UTC date.
    pub fn date(&self, column: &str) -> Result<NaiveDate, DbError> {
        match self.get(column)? {
            Cell::Date(d) => Ok(*d),
            Cell::Timestamp(t) => Ok(t.date_naive()),
            other => Err(self.mismatch(column, "date", other)),
        }
    }

    /// Accepts a timestamp, or a date taken as midnight UTC.
    pub fn optional_timestamp(&self, column: &str) -> Result<Option<DateTime<Utc>>, DbError> {
        match self.get(column)? {
            Cell::Null => Ok(None),
            Cell::Timestamp(t) => Ok(Some(*t)),
            Cell::Date(d) => Ok(Some(d.and_time(chrono::NaiveTime::MIN).and_utc())),
            other => Err(self.mismatch(column, "timestamp", other)),
        }
    }

    pub fn timestamp(&self, column: &str) -> Result<DateTime<Utc>, DbError> {
        self.optional_timestamp(column)?
            .ok_or_else(|| DbError::RowConversion(format!("column '{column}' is null")))
    }
}
