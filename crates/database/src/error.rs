use configuration::error::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to configure the warehouse connection: {0}")]
    ConnectionConfigError(String),

    #[error("Warehouse credentials are missing: {0}")]
    Credentials(#[from] ConfigError),

    #[error("Warehouse query failed: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("Invalid SQL identifier: '{0}'")]
    InvalidIdentifier(String),

    #[error("Column '{column}' has unsupported type {type_name}")]
    UnsupportedColumnType { column: String, type_name: String },

    #[error("Row conversion failed: {0}")]
    RowConversion(String),
}
