use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration from file: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    ValidationError(String),

    #[error("Required credential '{0}' is not set in the environment or the secret store")]
    MissingCredential(String),

    #[error("Failed to initialise logging: {0}")]
    Logging(String),
}
