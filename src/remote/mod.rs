//! Remote service layer for athena-query.
//!
//! Provides trait-based interfaces for the remote query service and the
//! object store holding query results, so the executor and cache can be
//! driven by AWS clients in production and by scripted mocks in tests.

mod athena;
mod mock;
mod s3;
mod sdk;
mod types;

pub use athena::AthenaQueryService;
pub use mock::{MockObjectStore, MockQueryService};
pub use s3::S3ObjectStore;
pub use types::{
    ErrorKind, ExecutionState, ExecutionStatus, RemoteError, RemoteResult, ResultPage,
    SubmitRequest,
};

use async_trait::async_trait;

/// Trait defining the remote asynchronous query service.
///
/// Implementations classify failures into [`ErrorKind`] so callers never
/// inspect SDK-specific error shapes.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Submits a query and returns the execution id assigned by the service.
    async fn submit(&self, request: &SubmitRequest) -> RemoteResult<String>;

    /// Fetches the current state of an execution.
    async fn get_status(&self, execution_id: &str) -> RemoteResult<ExecutionStatus>;

    /// Fetches one page of results. `next_token` is `None` for the first page.
    async fn get_results(
        &self,
        execution_id: &str,
        next_token: Option<&str>,
    ) -> RemoteResult<ResultPage>;
}

/// Trait defining the object store consulted to validate cached executions.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Returns `Ok(true)` if the object exists, `Ok(false)` on a not-found
    /// response, and an error for anything else.
    async fn head_exists(&self, bucket: &str, key: &str) -> RemoteResult<bool>;
}
