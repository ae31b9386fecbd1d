//! Execution cache for athena-query.
//!
//! Remembers which remote execution already answered a given query text so
//! the executor can fetch its results again instead of re-running the query.
//! Every cache operation is advisory: failures are logged and reported as a
//! miss, never as an error.

mod file;
mod location;

pub use file::{ExecutionRecord, FileExecutionCache};
pub use location::{parse_s3_location, S3Location};

use async_trait::async_trait;

/// A previously completed execution that may be reused.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionHandle {
    /// Original query text, without the comment prefix.
    pub query_sql: String,
    pub execution_id: String,
    /// Seconds since the Unix epoch when the execution was stored.
    pub timestamp: f64,
    /// Where the service wrote the result file.
    pub result_location: String,
    pub ttl_seconds: u64,
}

/// Trait for execution caches keyed by exact query text.
#[async_trait]
pub trait ExecutionCache: Send + Sync {
    /// Records a successful execution. Failures are logged and swallowed.
    async fn store(&self, query_sql: &str, execution_id: &str, result_location: &str);

    /// Returns a fresh execution whose results still exist, if any.
    async fn lookup(&self, query_sql: &str) -> Option<ExecutionHandle>;
}

/// Returns true if an entry stored at `timestamp` is still within `ttl_seconds`
/// at `now`. An entry exactly `ttl_seconds` old is still fresh.
pub fn is_fresh(timestamp: f64, ttl_seconds: u64, now: f64) -> bool {
    now - timestamp <= ttl_seconds as f64
}

/// Current time as fractional seconds since the Unix epoch.
pub fn now_epoch_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
