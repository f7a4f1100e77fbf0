//! Credential lookup for the external collectors and the warehouse.
//!
//! Collectors receive a [`CredentialsProvider`] at construction and resolve
//! everything they need up front, so a missing secret fails the run before any
//! network call is made.

use crate::error::ConfigError;
use std::collections::HashMap;
use std::env;
use std::path::Path;

/// Well-known credential names.
pub mod keys {
    pub const BANKING_API_TOKEN: &str = "BREX_API_TOKEN";
    pub const BANKING_CASH_ACCOUNT_ID: &str = "BREX_CASH_ACCOUNT_ID";
    pub const BILLING_API_KEY: &str = "STRIPE_KEY";
    pub const ANALYTICS_USERNAME: &str = "MIXPANEL_SERVICE_ACCOUNT_USERNAME";
    pub const ANALYTICS_PASSWORD: &str = "MIXPANEL_SERVICE_ACCOUNT_PASSWORD";
    pub const ANALYTICS_PROJECT_ID: &str = "MIXPANEL_PROJECT_ID";
    pub const WAREHOUSE_URL: &str = "DATABASE_URL";
}

/// A source of named secrets.
pub trait CredentialsProvider: Send + Sync {
    /// Returns the secret, or `None` if this provider does not have it.
    fn lookup(&self, key: &str) -> Option<String>;

    /// Like `lookup`, but a missing secret is an error.
    fn require(&self, key: &str) -> Result<String, ConfigError> {
        self.lookup(key)
            .ok_or_else(|| ConfigError::MissingCredential(key.to_string()))
    }
}

/// Reads secrets from process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialsProvider for EnvCredentials {
    fn lookup(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.is_empty())
    }
}

/// Secrets loaded from a flat TOML file of `KEY = "value"` pairs, the format
/// hosted dashboard platforms use for their secret stores.
#[derive(Debug, Clone, Default)]
pub struct SecretStoreCredentials {
    values: HashMap<String, String>,
}

impl SecretStoreCredentials {
    /// Loads the store from `path`. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No secret store file; skipping.");
            return Ok(Self::default());
        }

        // Read with `toml` directly: keys here are case-sensitive secret names.
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::ValidationError(format!("cannot read {}: {e}", path.display()))
        })?;
        let values = toml::from_str::<HashMap<String, String>>(&raw).map_err(|e| {
            ConfigError::ValidationError(format!("invalid secret store {}: {e}", path.display()))
        })?;

        Ok(Self { values })
    }

    pub fn from_map(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

impl CredentialsProvider for SecretStoreCredentials {
    fn lookup(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Tries each provider in order and returns the first hit.
#[derive(Default)]
pub struct ChainedCredentials {
    providers: Vec<Box<dyn CredentialsProvider>>,
}

impl ChainedCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl CredentialsProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// The environment first, then the secret store at `secrets_path`.
    pub fn standard(secrets_path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::new()
            .with(EnvCredentials)
            .with(SecretStoreCredentials::load(secrets_path)?))
    }
}

impl CredentialsProvider for ChainedCredentials {
    fn lookup(&self, key: &str) -> Option<String> {
        self.providers.iter().find_map(|p| p.lookup(key))
    }
}
