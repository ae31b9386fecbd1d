//! Execution reuse through the file-backed cache.
//!
//! Tests the executor and `FileExecutionCache` together: a successful
//! execution is recorded, and a later identical query reuses it only while
//! the record is fresh and its result object still exists.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use athena_query::cache::{now_epoch_seconds, ExecutionCache, ExecutionRecord, FileExecutionCache};
use athena_query::config::{AthenaConfig, CacheConfig};
use athena_query::query::{QueryExecutor, QueryRequest};
use athena_query::remote::{
    ExecutionState, MockObjectStore, MockQueryService, ObjectStore, RemoteError, ResultPage,
};
use athena_query::retry::RetryPolicy;
use tempfile::TempDir;

const SQL: &str = "SELECT region, count(*) AS n FROM events GROUP BY region";

fn page() -> ResultPage {
    let cell = |v: &str| Some(v.to_string());
    ResultPage {
        columns: vec![
            ("region".to_string(), "varchar".to_string()),
            ("n".to_string(), "bigint".to_string()),
        ],
        rows: vec![
            vec![cell("region"), cell("n")],
            vec![cell("eu"), cell("12")],
            vec![cell("us"), cell("30")],
        ],
        next_token: None,
    }
}

fn cache_config(dir: &Path) -> CacheConfig {
    CacheConfig {
        enabled: true,
        ttl_seconds: 3600,
        directory: dir.to_path_buf(),
    }
}

fn executor(
    service: Arc<MockQueryService>,
    dir: &Path,
    store: Arc<dyn ObjectStore>,
) -> QueryExecutor {
    let cache = FileExecutionCache::new(cache_config(dir), store);
    QueryExecutor::new(
        service,
        AthenaConfig::new("analytics", "primary", "s3://results-bucket/athena/"),
    )
    .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(1)))
    .with_poll_interval(Duration::ZERO)
    .with_cache(Arc::new(cache))
}

#[tokio::test]
async fn test_second_run_reuses_execution() {
    let tmp = TempDir::new().unwrap();
    let store = Arc::new(MockObjectStore::existing());
    let service = Arc::new(MockQueryService::new());
    service
        .push_submit(Ok("exec-1".to_string()))
        .push_state(ExecutionState::Running)
        .push_state(ExecutionState::Succeeded)
        .set_page(None, page());

    let executor = executor(service.clone(), tmp.path(), store.clone());

    let first = executor
        .execute_detailed(&QueryRequest::new(SQL).with_name("by_region"))
        .await
        .unwrap();
    assert!(!first.from_cache);
    assert!(tmp.path().join("exec-1.json").is_file());

    let second = executor
        .execute_detailed(&QueryRequest::new(SQL).with_name("by_region"))
        .await
        .unwrap();
    assert!(second.from_cache);
    assert_eq!(second.execution_id, "exec-1");
    assert_eq!(second.result, first.result);
    assert_eq!(second.result.row_count, 2);

    // One submission in total; the reuse only fetched results again.
    assert_eq!(service.submitted().len(), 1);
    assert_eq!(service.result_calls().len(), 2);
    assert_eq!(
        store.calls(),
        vec![(
            "results-bucket".to_string(),
            "athena/exec-1.csv".to_string()
        )]
    );
}

#[tokio::test]
async fn test_record_matches_on_disk_format() {
    let tmp = TempDir::new().unwrap();
    let service = Arc::new(MockQueryService::new());
    service.push_submit(Ok("exec-7".to_string()));

    executor(service, tmp.path(), Arc::new(MockObjectStore::existing()))
        .execute(SQL, Some("by_region"))
        .await
        .unwrap();

    let content = std::fs::read_to_string(tmp.path().join("exec-7.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(value["query_sql"], SQL);
    assert_eq!(value["execution_id"], "exec-7");
    assert_eq!(
        value["s3_location"],
        "s3://results-bucket/athena/exec-7.csv"
    );
    assert_eq!(value["ttl_seconds"], 3600);
    assert!(value["timestamp"].as_f64().unwrap() > 0.0);
}

#[tokio::test]
async fn test_different_text_is_a_miss() {
    let tmp = TempDir::new().unwrap();
    let service = Arc::new(MockQueryService::new());
    service
        .push_submit(Ok("exec-1".to_string()))
        .push_submit(Ok("exec-2".to_string()));

    let executor = executor(service.clone(), tmp.path(), Arc::new(MockObjectStore::existing()));
    executor.execute(SQL, None).await.unwrap();
    executor.execute(&format!("{SQL} "), None).await.unwrap();

    assert_eq!(service.submitted().len(), 2);
}

#[tokio::test]
async fn test_stale_record_resubmits() {
    let tmp = TempDir::new().unwrap();
    let old = ExecutionRecord {
        query_sql: Some(SQL.to_string()),
        execution_id: Some("exec-old".to_string()),
        timestamp: Some(now_epoch_seconds() - 7200.0),
        s3_location: Some("s3://results-bucket/athena/exec-old.csv".to_string()),
        ttl_seconds: Some(3600),
    };
    std::fs::write(
        tmp.path().join("exec-old.json"),
        serde_json::to_string_pretty(&old).unwrap(),
    )
    .unwrap();

    let service = Arc::new(MockQueryService::new());
    service.push_submit(Ok("exec-new".to_string()));

    let outcome = executor(service.clone(), tmp.path(), Arc::new(MockObjectStore::existing()))
        .execute_detailed(&QueryRequest::new(SQL))
        .await
        .unwrap();

    assert!(!outcome.from_cache);
    assert_eq!(outcome.execution_id, "exec-new");
    assert_eq!(service.submitted().len(), 1);
}

#[tokio::test]
async fn test_missing_result_object_resubmits() {
    let tmp = TempDir::new().unwrap();
    let service = Arc::new(MockQueryService::new());
    service
        .push_submit(Ok("exec-1".to_string()))
        .push_submit(Ok("exec-2".to_string()));

    let executor = executor(service.clone(), tmp.path(), Arc::new(MockObjectStore::missing()));
    executor.execute(SQL, None).await.unwrap();
    let second = executor
        .execute_detailed(&QueryRequest::new(SQL))
        .await
        .unwrap();

    assert!(!second.from_cache);
    assert_eq!(second.execution_id, "exec-2");
    assert_eq!(service.submitted().len(), 2);
}

#[tokio::test]
async fn test_object_store_failure_is_a_miss() {
    let tmp = TempDir::new().unwrap();
    let service = Arc::new(MockQueryService::new());
    let store = Arc::new(MockObjectStore::failing(RemoteError::client("Forbidden")));

    let executor = executor(service.clone(), tmp.path(), store);
    executor.execute(SQL, None).await.unwrap();
    executor.execute(SQL, None).await.unwrap();

    assert_eq!(service.submitted().len(), 2);
}

#[tokio::test]
async fn test_failed_execution_leaves_no_record() {
    let tmp = TempDir::new().unwrap();
    let service = Arc::new(MockQueryService::new());
    service.push_state(ExecutionState::Cancelled);

    let result = executor(service, tmp.path(), Arc::new(MockObjectStore::existing()))
        .execute(SQL, None)
        .await;

    assert!(result.is_err());
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_unwritable_cache_does_not_fail_query() {
    let tmp = TempDir::new().unwrap();
    // A regular file where the cache directory should be.
    let blocked = tmp.path().join("cache");
    std::fs::write(&blocked, "not a directory").unwrap();

    let service = Arc::new(MockQueryService::new());
    service.set_page(None, page());
    let cache = FileExecutionCache::new(
        cache_config(&blocked),
        Arc::new(MockObjectStore::existing()),
    );
    cache.store(SQL, "exec-1", "s3://results-bucket/athena/exec-1.csv").await;
    assert!(cache.lookup(SQL).await.is_none());

    let result = executor(service, &blocked, Arc::new(MockObjectStore::existing()))
        .execute(SQL, None)
        .await
        .unwrap();
    assert_eq!(result.row_count, 2);
}
