//! Mock remote services for testing.
//!
//! Responses are scripted up front and every call is recorded so tests can
//! assert on what the executor and cache actually sent.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::types::{
    ExecutionState, ExecutionStatus, RemoteError, RemoteResult, ResultPage, SubmitRequest,
};
use super::{ObjectStore, QueryService};

/// Execution id returned by `submit` once the scripted ids run out.
const DEFAULT_EXECUTION_ID: &str = "mock-execution";

/// A mock query service that replays scripted responses.
///
/// When a script queue is empty, `submit` returns [`DEFAULT_EXECUTION_ID`] and
/// `get_status` reports `SUCCEEDED`. Result pages are keyed by continuation
/// token; a missing page is an empty one.
#[derive(Debug, Default)]
pub struct MockQueryService {
    submit_script: Mutex<VecDeque<RemoteResult<String>>>,
    status_script: Mutex<VecDeque<RemoteResult<ExecutionStatus>>>,
    results_script: Mutex<VecDeque<RemoteError>>,
    pages: Mutex<HashMap<Option<String>, ResultPage>>,
    submitted: Mutex<Vec<SubmitRequest>>,
    status_calls: Mutex<Vec<String>>,
    result_calls: Mutex<Vec<(String, Option<String>)>>,
}

impl MockQueryService {
    /// Creates a mock with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the outcome of the next `submit` call.
    pub fn push_submit(&self, outcome: RemoteResult<String>) -> &Self {
        lock(&self.submit_script).push_back(outcome);
        self
    }

    /// Queues the outcome of the next `get_status` call.
    pub fn push_status(&self, outcome: RemoteResult<ExecutionStatus>) -> &Self {
        lock(&self.status_script).push_back(outcome);
        self
    }

    /// Queues a status with the given state and no reason.
    pub fn push_state(&self, state: ExecutionState) -> &Self {
        self.push_status(Ok(ExecutionStatus::new(state)))
    }

    /// Queues a failure for the next `get_results` call.
    pub fn push_results_error(&self, error: RemoteError) -> &Self {
        lock(&self.results_script).push_back(error);
        self
    }

    /// Registers the page returned for `token` (`None` for the first page).
    pub fn set_page(&self, token: Option<&str>, page: ResultPage) -> &Self {
        lock(&self.pages).insert(token.map(String::from), page);
        self
    }

    /// Returns every submit request received, in order.
    pub fn submitted(&self) -> Vec<SubmitRequest> {
        lock(&self.submitted).clone()
    }

    /// Returns the execution ids passed to `get_status`, in order.
    pub fn status_calls(&self) -> Vec<String> {
        lock(&self.status_calls).clone()
    }

    /// Returns `(execution_id, token)` for every `get_results` call, in order.
    pub fn result_calls(&self) -> Vec<(String, Option<String>)> {
        lock(&self.result_calls).clone()
    }
}

#[async_trait]
impl QueryService for MockQueryService {
    async fn submit(&self, request: &SubmitRequest) -> RemoteResult<String> {
        lock(&self.submitted).push(request.clone());
        lock(&self.submit_script)
            .pop_front()
            .unwrap_or_else(|| Ok(DEFAULT_EXECUTION_ID.to_string()))
    }

    async fn get_status(&self, execution_id: &str) -> RemoteResult<ExecutionStatus> {
        lock(&self.status_calls).push(execution_id.to_string());
        lock(&self.status_script)
            .pop_front()
            .unwrap_or_else(|| Ok(ExecutionStatus::new(ExecutionState::Succeeded)))
    }

    async fn get_results(
        &self,
        execution_id: &str,
        next_token: Option<&str>,
    ) -> RemoteResult<ResultPage> {
        lock(&self.result_calls).push((execution_id.to_string(), next_token.map(String::from)));
        if let Some(error) = lock(&self.results_script).pop_front() {
            return Err(error);
        }
        Ok(lock(&self.pages)
            .get(&next_token.map(String::from))
            .cloned()
            .unwrap_or_default())
    }
}

/// Response of the mock object store.
#[derive(Debug, Clone, PartialEq, Eq)]
enum HeadBehavior {
    Exists,
    NotFound,
    Fail(RemoteError),
}

/// A mock object store with a single fixed answer for every object.
#[derive(Debug)]
pub struct MockObjectStore {
    behavior: HeadBehavior,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockObjectStore {
    /// Every object exists.
    pub fn existing() -> Self {
        Self::with_behavior(HeadBehavior::Exists)
    }

    /// Every object is missing.
    pub fn missing() -> Self {
        Self::with_behavior(HeadBehavior::NotFound)
    }

    /// Every head request fails with `error`.
    pub fn failing(error: RemoteError) -> Self {
        Self::with_behavior(HeadBehavior::Fail(error))
    }

    fn with_behavior(behavior: HeadBehavior) -> Self {
        Self {
            behavior,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Returns every `(bucket, key)` checked, in order.
    pub fn calls(&self) -> Vec<(String, String)> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn head_exists(&self, bucket: &str, key: &str) -> RemoteResult<bool> {
        lock(&self.calls).push((bucket.to_string(), key.to_string()));
        match &self.behavior {
            HeadBehavior::Exists => Ok(true),
            HeadBehavior::NotFound => Ok(false),
            HeadBehavior::Fail(error) => Err(error.clone()),
        }
    }
}

// A panicking test thread must not cascade into unrelated assertions.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
