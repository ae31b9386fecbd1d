//! End-to-end batch runs from a configuration file.
//!
//! Loads a TOML run file, applies command-line overrides, and runs every
//! query through the batch runner with a scripted query service.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use athena_query::cli::Cli;
use athena_query::config::Config;
use athena_query::error::AthenaQueryError;
use athena_query::query::QueryExecutor;
use athena_query::remote::{ExecutionState, ExecutionStatus, MockQueryService, ResultPage};
use athena_query::retry::RetryPolicy;
use athena_query::runner::BatchRunner;
use clap::Parser;
use tempfile::TempDir;

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("queries.toml");
    let content = format!(
        r#"
[athena]
database = "analytics"
workgroup = "primary"
output_location = "s3://results-bucket/athena/"
poll_interval_ms = 1

[query_prefix]
tool_name = "nightly"

{body}
"#
    );
    std::fs::write(&path, content).unwrap();
    path
}

fn service() -> Arc<MockQueryService> {
    let service = Arc::new(MockQueryService::new());
    service.set_page(
        None,
        ResultPage {
            columns: vec![("day".to_string(), "date".to_string())],
            rows: vec![
                vec![Some("day".to_string())],
                vec![Some("2024-01-01".to_string())],
                vec![None],
            ],
            next_token: None,
        },
    );
    service
}

fn executor(config: &Config, service: Arc<MockQueryService>) -> QueryExecutor {
    QueryExecutor::new(service, config.athena.clone())
        .with_retry_policy(RetryPolicy::new(1, Duration::from_millis(1)))
        .with_tool_name(config.query_prefix.tool_name.clone())
}

#[tokio::test]
async fn test_table_batch_with_skip() {
    let tmp = TempDir::new().unwrap();
    let path = write_config(
        tmp.path(),
        r#"
[[queries]]
name = "days"
sql = "SELECT day FROM calendar"

[[queries]]
name = "retired"
sql = "SELECT 0"
skip = true
"#,
    );
    let config = Config::load_from_file(&path).unwrap();
    let service = service();
    let executor = executor(&config, service.clone());

    let mut out: Vec<u8> = Vec::new();
    let summary = BatchRunner::new(&executor, config.output.clone())
        .run(&config.queries, &mut out)
        .await
        .unwrap();

    assert_eq!(summary.executed, 1);
    assert_eq!(summary.skipped, 1);

    let submitted = service.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(
        submitted[0].sql,
        "-- [nightly] query_name=days\nSELECT day FROM calendar"
    );
    assert_eq!(submitted[0].database, "analytics");

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("=== Query: days ==="));
    assert!(printed.contains("| 2024-01-01 |"));
    assert!(printed.contains("| NULL       |"));
    assert!(!printed.contains("retired"));
}

#[tokio::test]
async fn test_cli_overrides_write_json_files() {
    let tmp = TempDir::new().unwrap();
    let path = write_config(
        tmp.path(),
        r#"
[[queries]]
name = "first"
sql = "SELECT day FROM calendar"

[[queries]]
name = "second"
sql = "SELECT day FROM calendar LIMIT 1"
"#,
    );
    let out_file = tmp.path().join("report.json");
    let cli = Cli::parse_from([
        "athena-query",
        path.to_str().unwrap(),
        "--format",
        "json",
        "--output-file",
        out_file.to_str().unwrap(),
    ]);

    let mut config = Config::load_from_file(&cli.config).unwrap();
    cli.apply_overrides(&mut config).unwrap();
    let executor = executor(&config, service());

    BatchRunner::new(&executor, config.output.clone())
        .run(&config.queries, &mut std::io::sink())
        .await
        .unwrap();

    for name in ["first", "second"] {
        let file = tmp.path().join(format!("report_{name}.json"));
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(file).unwrap()).unwrap();
        assert_eq!(value["row_count"], 2);
        assert_eq!(value["columns"][0]["type"], "date");
        assert_eq!(value["rows"][1]["day"], serde_json::Value::Null);
    }
}

#[tokio::test]
async fn test_failure_stops_batch_with_query_exit_code() {
    let tmp = TempDir::new().unwrap();
    let path = write_config(
        tmp.path(),
        r#"
[output]
format = "csv"
file = "unused.csv"

[[queries]]
name = "broken"
sql = "SELECT * FROM nowhere"

[[queries]]
name = "never"
sql = "SELECT 1"
"#,
    );
    let config = Config::load_from_file(&path).unwrap();
    let service = service();
    service.push_status(Ok(ExecutionStatus::new(ExecutionState::Failed)
        .with_reason("TABLE_NOT_FOUND: Table analytics.nowhere does not exist")));
    let executor = executor(&config, service.clone());

    let err = BatchRunner::new(&executor, config.output.clone())
        .run(&config.queries, &mut std::io::sink())
        .await
        .unwrap_err();

    assert!(matches!(err, AthenaQueryError::QueryExecution(_)));
    assert_eq!(err.exit_code(), 3);
    assert!(err.to_string().contains("TABLE_NOT_FOUND"));
    assert_eq!(service.submitted().len(), 1);
}

#[test]
fn test_invalid_config_exit_code() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("queries.toml");
    std::fs::write(&path, "[athena]\ndatabase = \"db\"\n").unwrap();

    let err = Config::load_from_file(&path).unwrap_err();
    assert_eq!(err.exit_code(), 1);
}
