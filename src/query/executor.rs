//! Query execution against the remote query service.
//!
//! Owns the per-execution state machine: cache lookup, submission, polling
//! until a terminal state, result pagination, and storing successful
//! executions back into the cache.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::types::{Column, QueryResult, Row};
use crate::cache::{ExecutionCache, FileExecutionCache};
use crate::config::{AthenaConfig, Config, QueryPrefixConfig};
use crate::error::{AthenaQueryError, Result};
use crate::remote::{
    ExecutionState, ExecutionStatus, ObjectStore, QueryService, RemoteError, SubmitRequest,
};
use crate::retry::RetryPolicy;

/// Reason reported when a failed execution carries no explanation.
const UNKNOWN_ERROR: &str = "Unknown error";

/// A query to run, optionally named for the submitted comment prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    /// Query text as written by the user. This is also the cache key.
    pub sql: String,
    pub name: Option<String>,
}

impl QueryRequest {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Successful query execution outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutcome {
    /// The query result.
    pub result: QueryResult,
    /// Execution the results were read from.
    pub execution_id: String,
    /// True if a cached execution was reused instead of submitting the query.
    pub from_cache: bool,
}

/// Executes queries and retrieves their results.
pub struct QueryExecutor {
    service: Arc<dyn QueryService>,
    settings: AthenaConfig,
    retry: RetryPolicy,
    cache: Option<Arc<dyn ExecutionCache>>,
    tool_name: String,
    poll_interval: Duration,
}

impl QueryExecutor {
    /// Creates an executor with the default retry policy and no cache.
    pub fn new(service: Arc<dyn QueryService>, settings: AthenaConfig) -> Self {
        let poll_interval = settings.poll_interval();
        Self {
            service,
            settings,
            retry: RetryPolicy::default(),
            cache: None,
            tool_name: QueryPrefixConfig::default().tool_name,
            poll_interval,
        }
    }

    /// Creates an executor from a loaded run file.
    ///
    /// The file cache is attached only when `[cache]` is enabled; `object_store`
    /// is then used to check that cached result files still exist.
    pub fn from_config(
        config: &Config,
        service: Arc<dyn QueryService>,
        object_store: Arc<dyn ObjectStore>,
    ) -> Self {
        let executor = Self::new(service, config.athena.clone())
            .with_retry_policy(config.retry.policy())
            .with_tool_name(config.query_prefix.tool_name.clone());

        if !config.cache.enabled {
            return executor;
        }
        info!(
            "Cache enabled (TTL: {}s, directory: {})",
            config.cache.ttl_seconds,
            config.cache.directory.display()
        );
        let cache = FileExecutionCache::new(config.cache.clone(), object_store);
        executor.with_cache(Arc::new(cache))
    }

    /// Sets the retry policy used for every remote call.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Enables execution reuse through `cache`.
    pub fn with_cache(mut self, cache: Arc<dyn ExecutionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the tool name written into the comment prefix.
    pub fn with_tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = tool_name.into();
        self
    }

    /// Sets the delay between status polls.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Builds the single-line comment placed in front of submitted SQL.
    pub fn build_prefix(&self, query_name: Option<&str>) -> String {
        match query_name {
            Some(name) => format!("-- [{}] query_name={}\n", self.tool_name, name),
            None => format!("-- [{}]\n", self.tool_name),
        }
    }

    /// Returns where the service writes the result file of `execution_id`.
    pub fn result_location(&self, execution_id: &str) -> String {
        format!(
            "{}/{}.csv",
            self.settings.output_location.trim_end_matches('/'),
            execution_id
        )
    }

    /// Executes `sql` and returns its results, reusing a cached execution when possible.
    pub async fn execute(&self, sql: &str, query_name: Option<&str>) -> Result<QueryResult> {
        let mut request = QueryRequest::new(sql);
        request.name = query_name.map(String::from);
        Ok(self.execute_detailed(&request).await?.result)
    }

    /// Executes a query and reports which execution answered it.
    pub async fn execute_detailed(&self, request: &QueryRequest) -> Result<QueryOutcome> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.lookup(&request.sql).await {
                info!(
                    "Cache hit for query, reusing execution ID: {}",
                    cached.execution_id
                );
                let result = self.fetch_results(&cached.execution_id).await?;
                return Ok(QueryOutcome {
                    result,
                    execution_id: cached.execution_id,
                    from_cache: true,
                });
            }
        }

        let prefixed_sql = format!(
            "{}{}",
            self.build_prefix(request.name.as_deref()),
            request.sql
        );
        let execution_id = self.submit(prefixed_sql).await?;

        let status = self.wait_for_completion(&execution_id).await?;
        if status.state != ExecutionState::Succeeded {
            let reason = self.failure_reason(&execution_id, status).await;
            return Err(AthenaQueryError::query(format!("Query failed: {reason}")));
        }

        if let Some(cache) = &self.cache {
            let location = self.result_location(&execution_id);
            cache.store(&request.sql, &execution_id, &location).await;
            info!("Cached execution ID: {}", execution_id);
        }

        let result = self.fetch_results(&execution_id).await?;
        Ok(QueryOutcome {
            result,
            execution_id,
            from_cache: false,
        })
    }

    /// Submits the query and returns its execution id.
    async fn submit(&self, sql: String) -> Result<String> {
        let request = SubmitRequest {
            sql,
            database: self.settings.database.clone(),
            output_location: self.settings.output_location.clone(),
            workgroup: self.settings.workgroup.clone(),
        };

        let execution_id = self
            .retry
            .execute("StartQueryExecution", || self.service.submit(&request))
            .await
            .map_err(|e| AthenaQueryError::query(format!("Failed to submit query: {e}")))?;

        debug!("Submitted query, execution ID: {}", execution_id);
        Ok(execution_id)
    }

    /// Polls until the execution reaches a terminal state.
    ///
    /// There is no overall deadline: polling stops only at a terminal state or
    /// when a status call exhausts its retries.
    async fn wait_for_completion(&self, execution_id: &str) -> Result<ExecutionStatus> {
        loop {
            let status = self
                .retry
                .execute("GetQueryExecution", || self.service.get_status(execution_id))
                .await
                .map_err(|e| {
                    AthenaQueryError::query(format!("Failed to check query status: {e}"))
                })?;

            if status.state.is_terminal() {
                debug!("Execution {} finished: {}", execution_id, status.state);
                return Ok(status);
            }

            debug!("Execution {} is {}", execution_id, status.state);
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Explains why an execution ended in FAILED or CANCELLED.
    ///
    /// Uses the reason from the terminal status, asking the service once more
    /// if it was missing. Never fails.
    async fn failure_reason(&self, execution_id: &str, status: ExecutionStatus) -> String {
        if let Some(reason) = status.state_change_reason {
            return reason;
        }

        match self
            .retry
            .execute("GetQueryExecution", || self.service.get_status(execution_id))
            .await
        {
            Ok(status) => status
                .state_change_reason
                .unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
            Err(e) => {
                warn!("Could not fetch failure reason for {}: {}", execution_id, e);
                format!("Failed to retrieve error message: {e}")
            }
        }
    }

    /// Reads every result page of a succeeded execution.
    async fn fetch_results(&self, execution_id: &str) -> Result<QueryResult> {
        let map_err = |e: RemoteError| {
            AthenaQueryError::query(format!("Failed to retrieve query results: {e}"))
        };

        let first = self
            .retry
            .execute("GetQueryResults", || {
                self.service.get_results(execution_id, None)
            })
            .await
            .map_err(map_err)?;

        let columns: Vec<Column> = first
            .columns
            .into_iter()
            .map(|(name, data_type)| Column::new(name, data_type))
            .collect();

        // The first row of the first page repeats the column names.
        let mut rows: Vec<Row> = first.rows.into_iter().skip(1).collect();
        let mut next_token = first.next_token;

        while let Some(token) = next_token {
            let page = self
                .retry
                .execute("GetQueryResults", || {
                    self.service.get_results(execution_id, Some(&token))
                })
                .await
                .map_err(map_err)?;
            rows.extend(page.rows);
            next_token = page.next_token;
        }

        debug!("Fetched {} rows for execution {}", rows.len(), execution_id);
        Ok(QueryResult::with_data(columns, rows))
    }
}
