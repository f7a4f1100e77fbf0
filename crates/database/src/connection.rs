use crate::error::DbError;
use configuration::{keys, CredentialsProvider, WarehouseSettings};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;
use std::str::FromStr;
use std::time::Duration;

/// Opens the connection pool to the warehouse.
///
/// The server address and login come from the `DATABASE_URL` credential; the
/// database name from `settings` takes precedence over any in the URL.
///
/// # Errors
///
/// `Credentials` if `DATABASE_URL` is not set, `ConnectionConfigError` if it
/// does not parse, and `QueryError` if the server cannot be reached.
pub async fn connect(
    settings: &WarehouseSettings,
    credentials: &dyn CredentialsProvider,
) -> Result<PgPool, DbError> {
    let url = credentials.require(keys::WAREHOUSE_URL)?;

    let options = PgConnectOptions::from_str(&url)
        .map_err(|e| DbError::ConnectionConfigError(format!("invalid {}: {e}", keys::WAREHOUSE_URL)))?
        .database(&settings.database.to_lowercase());

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await?;

    tracing::info!(warehouse = %settings.name, database = %settings.database, "Connected to the warehouse.");
    Ok(pool)
}
