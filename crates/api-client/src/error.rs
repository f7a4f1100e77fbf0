use configuration::error::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("The API request returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),

    #[error("Pagination stopped making progress: {0}")]
    PaginationStalled(String),

    #[error("Cache file error: {0}")]
    Cache(String),

    #[error("Collector is not configured: {0}")]
    Config(#[from] ConfigError),
}

impl ApiError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ApiError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
