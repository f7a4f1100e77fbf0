//! File cache for collector output.
//!
//! Each collector owns one JSON file with a fixed name inside the configured
//! cache directory. A present file short-circuits the live call unless a
//! refresh is forced; every live call rewrites the file.

use crate::error::ApiError;
use configuration::CacheConfig;
use core_types::CollectorKind;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::path::PathBuf;

fn cache_path(config: &CacheConfig, kind: CollectorKind) -> Option<PathBuf> {
    config
        .cache_dir
        .as_ref()
        .map(|dir| dir.join(kind.cache_file_name()))
}

/// Returns the cached records for `kind` if allowed, otherwise runs `fetch`
/// and stores its result.
pub async fn cached<T, F, Fut>(config: &CacheConfig, kind: CollectorKind, fetch: F) -> Result<Vec<T>, ApiError>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, ApiError>>,
{
    let Some(path) = cache_path(config, kind) else {
        return fetch().await;
    };

    if !config.force_refresh && tokio::fs::try_exists(&path).await.unwrap_or(false) {
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| ApiError::Cache(format!("cannot read {}: {e}", path.display())))?;
        let records: Vec<T> = serde_json::from_str(&raw)
            .map_err(|e| ApiError::Cache(format!("corrupt cache file {}: {e}", path.display())))?;
        tracing::info!(collector = %kind, records = records.len(), path = %path.display(), "Loaded from cache.");
        return Ok(records);
    }

    let records = fetch().await?;

    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ApiError::Cache(format!("cannot create {}: {e}", dir.display())))?;
    }
    let json = serde_json::to_string(&records).map_err(|e| ApiError::Cache(e.to_string()))?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|e| ApiError::Cache(format!("cannot write {}: {e}", path.display())))?;
    tracing::debug!(collector = %kind, records = records.len(), path = %path.display(), "Cache file written.");

    Ok(records)
}
