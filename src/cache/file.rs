//! Directory-backed execution cache.
//!
//! Each execution is one pretty-printed JSON file named after its execution id.
//! The field names match caches written by earlier versions of the tool.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::location::parse_s3_location;
use super::{is_fresh, now_epoch_seconds, ExecutionCache, ExecutionHandle};
use crate::config::CacheConfig;
use crate::remote::ObjectStore;

/// On-disk cache entry.
///
/// Every field is optional on read so that a partially written or hand-edited
/// record is skipped instead of aborting the scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExecutionRecord {
    #[serde(default)]
    pub query_sql: Option<String>,
    #[serde(default)]
    pub execution_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<f64>,
    #[serde(default)]
    pub s3_location: Option<String>,
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

/// Execution cache storing one JSON record per execution in a directory.
pub struct FileExecutionCache {
    config: CacheConfig,
    object_store: Arc<dyn ObjectStore>,
}

impl FileExecutionCache {
    /// Creates the cache, creating its directory if caching is enabled.
    ///
    /// Directory creation is best-effort; a failure only means later writes
    /// will fail and be logged.
    pub fn new(config: CacheConfig, object_store: Arc<dyn ObjectStore>) -> Self {
        let cache = Self {
            config,
            object_store,
        };
        cache.ensure_directory();
        cache
    }

    fn ensure_directory(&self) {
        if !self.config.enabled {
            return;
        }

        match std::fs::create_dir_all(&self.config.directory) {
            Ok(()) => debug!("Cache directory ensured: {}", self.config.directory.display()),
            Err(e) => warn!(
                "Failed to create cache directory {}: {e}",
                self.config.directory.display()
            ),
        }
    }

    /// Returns the record file path for an execution id.
    pub fn record_path(&self, execution_id: &str) -> PathBuf {
        let file_stem: String = execution_id
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.config.directory.join(format!("{file_stem}.json"))
    }

    /// Checks that the result object behind `location` still exists.
    ///
    /// Malformed locations and remote failures both count as missing.
    pub async fn validate_remote_exists(&self, location: &str) -> bool {
        let Some(parsed) = parse_s3_location(location) else {
            warn!("Invalid S3 location format: {location}");
            return false;
        };

        match self
            .object_store
            .head_exists(&parsed.bucket, &parsed.key)
            .await
        {
            Ok(true) => true,
            Ok(false) => {
                debug!("S3 object not found: {location}");
                false
            }
            Err(e) => {
                warn!("S3 error validating cache ({}): {e}", e.kind);
                false
            }
        }
    }

    /// Reads one record, returning a handle if it matches and is reusable.
    async fn check_record(&self, path: &Path, query_sql: &str) -> Option<ExecutionHandle> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read cache file {}: {e}", path.display());
                return None;
            }
        };

        let record: ExecutionRecord = match serde_json::from_str(&content) {
            Ok(record) => record,
            Err(e) => {
                warn!("Failed to parse cache file {}: {e}", path.display());
                return None;
            }
        };

        if record.query_sql.as_deref() != Some(query_sql) {
            return None;
        }

        let execution_id = record.execution_id.filter(|id| !id.is_empty());
        let location = record.s3_location.filter(|loc| !loc.is_empty());
        let (Some(execution_id), Some(timestamp), Some(location)) =
            (execution_id, record.timestamp, location)
        else {
            warn!(
                "Invalid cache entry in {}: missing required fields",
                path.display()
            );
            return None;
        };

        let ttl_seconds = record.ttl_seconds.unwrap_or(self.config.ttl_seconds);
        if !is_fresh(timestamp, ttl_seconds, now_epoch_seconds()) {
            debug!("Cache entry in {} is stale", path.display());
            return None;
        }

        if !self.validate_remote_exists(&location).await {
            debug!(
                "S3 result for cache entry in {} no longer exists",
                path.display()
            );
            return None;
        }

        Some(ExecutionHandle {
            query_sql: query_sql.to_string(),
            execution_id,
            timestamp,
            result_location: location,
            ttl_seconds,
        })
    }
}

#[async_trait]
impl ExecutionCache for FileExecutionCache {
    async fn store(&self, query_sql: &str, execution_id: &str, result_location: &str) {
        if !self.config.enabled {
            return;
        }

        let record = ExecutionRecord {
            query_sql: Some(query_sql.to_string()),
            execution_id: Some(execution_id.to_string()),
            timestamp: Some(now_epoch_seconds()),
            s3_location: Some(result_location.to_string()),
            ttl_seconds: Some(self.config.ttl_seconds),
        };

        let path = self.record_path(execution_id);
        let json = match serde_json::to_string_pretty(&record) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize cache entry for {execution_id}: {e}");
                return;
            }
        };

        match tokio::fs::write(&path, json).await {
            Ok(()) => debug!("Stored cache entry: {}", path.display()),
            Err(e) => warn!("Failed to write cache file {}: {e}", path.display()),
        }
    }

    async fn lookup(&self, query_sql: &str) -> Option<ExecutionHandle> {
        if !self.config.enabled {
            return None;
        }

        let mut entries = match tokio::fs::read_dir(&self.config.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to list cache directory: {e}");
                return None;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to list cache directory: {e}");
                    break;
                }
            };

            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }

            if let Some(handle) = self.check_record(&path, query_sql).await {
                info!("Found valid cached execution: {}", handle.execution_id);
                return Some(handle);
            }
        }

        None
    }
}
