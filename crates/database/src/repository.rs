use crate::records::{from_row_set, to_row_set, TableRecord};
use crate::table::{identifier, Cell, ColumnType, RowSet, WarehouseTarget};
use crate::DbError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgColumn, PgPool, PgRow, Postgres};
use sqlx::query_builder::Separated;
use sqlx::{Column, QueryBuilder, Row, TypeInfo};

/// Postgres caps a single statement at this many bind parameters.
const MAX_BIND_PARAMS: usize = 65_535;

/// The `Warehouse` is the only place SQL is written. Everything above it
/// exchanges [`RowSet`]s or typed [`TableRecord`]s.
#[derive(Debug, Clone)]
pub struct Warehouse {
    pool: PgPool,
}

impl Warehouse {
    /// Creates a new `Warehouse` over a shared connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the schema and table for `target` if they do not exist yet.
    pub async fn ensure_table(
        &self,
        target: &WarehouseTarget,
        columns: &[(&str, ColumnType)],
    ) -> Result<(), DbError> {
        let schema = identifier(&target.schema)?;
        let table = target.qualified_name()?;
        let column_defs = columns
            .iter()
            .map(|(name, ty)| Ok(format!("{} {}", identifier(name)?, ty.sql())))
            .collect::<Result<Vec<_>, DbError>>()?
            .join(", ");

        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {schema}"))
            .execute(&self.pool)
            .await?;
        sqlx::query(&format!("CREATE TABLE IF NOT EXISTS {table} ({column_defs})"))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Writes `rows` to `target`, first deleting every existing row when
    /// `clear_table` is set. The delete and all inserts share one
    /// transaction, so a failed load leaves the previous contents in place.
    ///
    /// # Returns
    ///
    /// The number of rows inserted.
    pub async fn write_table(
        &self,
        target: &WarehouseTarget,
        rows: &RowSet,
        clear_table: bool,
    ) -> Result<u64, DbError> {
        let table = target.qualified_name()?;
        let columns = rows
            .columns()
            .iter()
            .map(|c| identifier(c))
            .collect::<Result<Vec<_>, DbError>>()?
            .join(", ");

        let mut tx = self.pool.begin().await?;

        if clear_table {
            let deleted = sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?
                .rows_affected();
            tracing::debug!(%target, deleted, "Cleared table.");
        }

        let mut written = 0;
        if !rows.columns().is_empty() {
            let per_statement = (MAX_BIND_PARAMS / rows.columns().len()).max(1);
            for chunk in rows.rows().chunks(per_statement) {
                let mut builder: QueryBuilder<Postgres> =
                    QueryBuilder::new(format!("INSERT INTO {table} ({columns}) "));
                builder.push_values(chunk, |mut separated, row| {
                    for cell in row {
                        push_cell(&mut separated, cell);
                    }
                });
                written += builder.build().execute(&mut *tx).await?.rows_affected();
            }
        }

        tx.commit().await?;
        tracing::info!(%target, rows = written, clear_table, "Table written.");
        Ok(written)
    }

    /// Reads every row of `target`. Column names come back lower-cased.
    pub async fn read_table(&self, target: &WarehouseTarget) -> Result<RowSet, DbError> {
        let table = target.qualified_name()?;
        let rows = sqlx::query(&format!("SELECT * FROM {table}"))
            .fetch_all(&self.pool)
            .await?;

        let columns: Vec<String> = rows
            .first()
            .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let cells = rows
            .iter()
            .map(|row| {
                row.columns()
                    .iter()
                    .enumerate()
                    .map(|(idx, column)| decode_cell(row, idx, column))
                    .collect::<Result<Vec<_>, DbError>>()
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        tracing::debug!(%target, rows = cells.len(), "Table read.");
        RowSet::new(columns, cells)
    }

    /// Creates the table if needed and writes `records` to it.
    pub async fn write_records<R: TableRecord>(
        &self,
        target: &WarehouseTarget,
        records: &[R],
        clear_table: bool,
    ) -> Result<u64, DbError> {
        self.ensure_table(target, R::COLUMNS).await?;
        self.write_table(target, &to_row_set(records)?, clear_table).await
    }

    pub async fn read_records<R: TableRecord>(&self, target: &WarehouseTarget) -> Result<Vec<R>, DbError> {
        from_row_set(&self.read_table(target).await?)
    }
}

fn push_cell(separated: &mut Separated<'_, '_, Postgres, &'static str>, cell: &Cell) {
    match cell {
        Cell::Null => {
            separated.push("NULL");
        }
        Cell::Int(v) => {
            separated.push_bind(*v);
        }
        Cell::Decimal(v) => {
            separated.push_bind(*v);
        }
        Cell::Text(v) => {
            separated.push_bind(v.clone());
        }
        Cell::Date(v) => {
            separated.push_bind(*v);
        }
        Cell::Timestamp(v) => {
            separated.push_bind(*v);
        }
        Cell::Bool(v) => {
            separated.push_bind(*v);
        }
    }
}

fn float_cell(value: Option<f64>, column: &str) -> Result<Option<Cell>, DbError> {
    value
        .map(|v| {
            Decimal::try_from(v)
                .map(Cell::Decimal)
                .map_err(|e| DbError::RowConversion(format!("column '{column}': {e}")))
        })
        .transpose()
}

fn decode_cell(row: &PgRow, idx: usize, column: &PgColumn) -> Result<Cell, DbError> {
    let name = column.name();
    let cell = match column.type_info().name() {
        "INT2" => row.try_get::<Option<i16>, _>(idx)?.map(|v| Cell::Int(v.into())),
        "INT4" => row.try_get::<Option<i32>, _>(idx)?.map(|v| Cell::Int(v.into())),
        "INT8" => row.try_get::<Option<i64>, _>(idx)?.map(Cell::Int),
        "NUMERIC" => row.try_get::<Option<Decimal>, _>(idx)?.map(Cell::Decimal),
        "FLOAT4" => float_cell(row.try_get::<Option<f32>, _>(idx)?.map(f64::from), name)?,
        "FLOAT8" => float_cell(row.try_get::<Option<f64>, _>(idx)?, name)?,
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => row.try_get::<Option<String>, _>(idx)?.map(Cell::Text),
        "DATE" => row.try_get::<Option<NaiveDate>, _>(idx)?.map(Cell::Date),
        "TIMESTAMPTZ" => row.try_get::<Option<DateTime<Utc>>, _>(idx)?.map(Cell::Timestamp),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(idx)?
            .map(|v| Cell::Timestamp(v.and_utc())),
        "BOOL" => row.try_get::<Option<bool>, _>(idx)?.map(Cell::Bool),
        other => {
            return Err(DbError::UnsupportedColumnType {
                column: name.to_string(),
                type_name: other.to_string(),
            })
        }
    };
    Ok(cell.unwrap_or(Cell::Null))
}
