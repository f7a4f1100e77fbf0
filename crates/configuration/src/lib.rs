use crate::error::ConfigError;
use crate::settings::Settings;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod credentials;
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use credentials::{
    keys, ChainedCredentials, CredentialsProvider, EnvCredentials, SecretStoreCredentials,
};
pub use logging::init_logging;
pub use settings::{
    CacheConfig, CashflowSettings, CohortSettings, CollectorSettings, LoggingConfig, RetryConfig,
    RevenueSettings, RunwayOverrides, RunwaySettings, SecretsSettings, WarehouseSettings,
};

/// Loads the application configuration.
///
/// Sources, later ones overriding earlier ones:
/// 1. built-in defaults,
/// 2. `pulse.toml` in the working directory (or `path` if given), if present,
/// 3. `PULSE__SECTION__KEY` environment variables.
pub fn load_config(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("pulse").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("PULSE")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;
    validate(&settings)?;

    Ok(settings)
}

/// Rejects values the models cannot work with.
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    let invalid = |msg: String| Err(ConfigError::ValidationError(msg));

    if !(1..=12).contains(&settings.runway.number_months) {
        return invalid(format!(
            "runway.number_months must be between 1 and 12, got {}",
            settings.runway.number_months
        ));
    }
    if settings.runway.max_months == 0 {
        return invalid("runway.max_months must be positive".to_string());
    }
    if settings.collectors.page_size == 0 {
        return invalid("collectors.page_size must be positive".to_string());
    }
    if settings.collectors.retry.max_attempts == 0 {
        return invalid("collectors.retry.max_attempts must be at least 1".to_string());
    }
    if settings.revenue.trailing_weeks <= 0 {
        return invalid("revenue.trailing_weeks must be positive".to_string());
    }

    Ok(())
}
