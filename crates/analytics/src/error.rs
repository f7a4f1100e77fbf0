use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AnalyticsError {
    /// Zero rows where a ratio or min/max/mean is required. Callers are expected
    /// to recover by reporting the figure as absent.
    #[error("Not enough data to perform calculation: {0}")]
    EmptyDataset(String),

    #[error("Invalid input for analytics calculation: {0}")]
    InvalidInput(String),

    #[error("Calendar error: {0}")]
    Calendar(#[from] core_types::CoreError),
}
