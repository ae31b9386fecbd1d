//! Batch execution of the configured queries.
//!
//! Runs each query through one [`QueryExecutor`] in file order and routes its
//! result to the configured output, stopping at the first failure.

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::{OutputConfig, OutputFormat, QueryConfig};
use crate::error::{AthenaQueryError, Result};
use crate::output::{self, DEFAULT_MAX_WIDTH};
use crate::query::{QueryExecutor, QueryRequest, QueryResult};

/// Outcome of a completed batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub executed: usize,
    pub skipped: usize,
    /// `(query name, rows returned)` for every executed query, in order.
    pub rows: Vec<(String, usize)>,
}

impl RunSummary {
    pub fn total_rows(&self) -> usize {
        self.rows.iter().map(|(_, count)| count).sum()
    }
}

/// Runs a list of queries and writes their results.
pub struct BatchRunner<'a> {
    executor: &'a QueryExecutor,
    output: OutputConfig,
}

impl<'a> BatchRunner<'a> {
    pub fn new(executor: &'a QueryExecutor, output: OutputConfig) -> Self {
        Self { executor, output }
    }

    /// Executes `queries` in order. Table output and file notices go to `out`.
    pub async fn run(&self, queries: &[QueryConfig], out: &mut dyn Write) -> Result<RunSummary> {
        let total = queries.len();
        let mut summary = RunSummary::default();

        for (i, query) in queries.iter().enumerate() {
            let position = i + 1;
            if query.skip {
                info!("Skipping query {}/{}: {}", position, total, query.name);
                summary.skipped += 1;
                continue;
            }

            info!("Executing query {}/{}: {}", position, total, query.name);
            debug!("SQL: {}", query.sql);

            let request = QueryRequest::new(query.sql.as_str()).with_name(query.name.as_str());
            let outcome = self.executor.execute_detailed(&request).await?;
            info!(
                "Query '{}' completed successfully: {} rows returned{}",
                query.name,
                outcome.result.row_count,
                if outcome.from_cache { " (cached)" } else { "" }
            );

            self.emit(&query.name, &outcome.result, total > 1, out)?;

            summary.executed += 1;
            summary
                .rows
                .push((query.name.clone(), outcome.result.row_count));
        }

        info!(
            "All queries executed successfully ({} executed, {} skipped)",
            summary.executed, summary.skipped
        );
        Ok(summary)
    }

    fn emit(
        &self,
        name: &str,
        result: &QueryResult,
        multiple: bool,
        out: &mut dyn Write,
    ) -> Result<()> {
        let console_err =
            |e: std::io::Error| AthenaQueryError::internal(format!("Failed to write output: {e}"));

        let write_file: fn(&QueryResult, &Path) -> Result<()> = match self.output.format {
            OutputFormat::Table => {
                let table = output::format_as_table(result, DEFAULT_MAX_WIDTH);
                writeln!(out, "\n=== Query: {name} ===\n{table}\n").map_err(console_err)?;
                return Ok(());
            }
            OutputFormat::Csv => output::write_to_csv,
            OutputFormat::Json => output::write_to_json,
        };

        let base = self.output.file.as_deref().ok_or_else(|| {
            AthenaQueryError::config(format!(
                "{} output format requires 'output.file' to be specified",
                self.output.format.as_str().to_uppercase()
            ))
        })?;
        let path = output_path_for(base, name, multiple);
        write_file(result, &path)?;

        info!(
            "Results written to {} file: {}",
            self.output.format.as_str().to_uppercase(),
            path.display()
        );
        writeln!(out, "Query '{name}': Results written to {}", path.display())
            .map_err(console_err)?;
        Ok(())
    }
}

/// Returns the file a query's results go to.
///
/// With more than one query in the batch, the query name is inserted before
/// the extension: `out.csv` becomes `out_<name>.csv`, `out` becomes `out_<name>`.
pub fn output_path_for(base: &Path, name: &str, multiple: bool) -> PathBuf {
    if !multiple {
        return base.to_path_buf();
    }

    let stem = base.file_stem().unwrap_or_default();
    let mut file_name = OsString::from(stem);
    file_name.push("_");
    file_name.push(name);
    if let Some(ext) = base.extension() {
        file_name.push(".");
        file_name.push(ext);
    }
    base.with_file_name(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AthenaConfig;
    use crate::remote::{ExecutionState, ExecutionStatus, MockQueryService, ResultPage};
    use crate::retry::RetryPolicy;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn query(name: &str, sql: &str) -> QueryConfig {
        QueryConfig {
            name: name.to_string(),
            sql: sql.to_string(),
            skip: false,
        }
    }

    fn service_with_page() -> Arc<MockQueryService> {
        let service = Arc::new(MockQueryService::new());
        service.set_page(
            None,
            ResultPage {
                columns: vec![("n".to_string(), "integer".to_string())],
                rows: vec![vec![Some("n".to_string())], vec![Some("7".to_string())]],
                next_token: None,
            },
        );
        service
    }

    fn executor(service: Arc<MockQueryService>) -> QueryExecutor {
        QueryExecutor::new(service, AthenaConfig::new("db", "wg", "s3://b/r/"))
            .with_retry_policy(RetryPolicy::new(1, Duration::from_millis(1)))
            .with_poll_interval(Duration::ZERO)
    }

    #[test]
    fn test_output_path_single_query_unchanged() {
        assert_eq!(
            output_path_for(Path::new("out.csv"), "daily", false),
            PathBuf::from("out.csv")
        );
    }

    #[test]
    fn test_output_path_inserts_name_before_extension() {
        assert_eq!(
            output_path_for(Path::new("reports/out.csv"), "daily", true),
            PathBuf::from("reports/out_daily.csv")
        );
    }

    #[test]
    fn test_output_path_without_extension() {
        assert_eq!(
            output_path_for(Path::new("out"), "daily", true),
            PathBuf::from("out_daily")
        );
    }

    #[test]
    fn test_output_path_ignores_dots_in_directories() {
        assert_eq!(
            output_path_for(Path::new("v1.2/out"), "daily", true),
            PathBuf::from("v1.2/out_daily")
        );
    }

    #[tokio::test]
    async fn test_table_output() {
        let service = service_with_page();
        let executor = executor(service.clone());
        let runner = BatchRunner::new(&executor, OutputConfig::default());

        let mut out: Vec<u8> = Vec::new();
        let summary = runner
            .run(&[query("lucky", "SELECT 7 AS n")], &mut out)
            .await
            .unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("\n=== Query: lucky ===\n+---+"));
        assert!(printed.contains("| 7 |"));
        assert_eq!(summary.executed, 1);
        assert_eq!(summary.rows, vec![("lucky".to_string(), 1)]);
        assert_eq!(
            service.submitted()[0].sql,
            "-- [athena-query] query_name=lucky\nSELECT 7 AS n"
        );
    }

    #[tokio::test]
    async fn test_skipped_queries_are_not_submitted() {
        let service = service_with_page();
        let executor = executor(service.clone());
        let runner = BatchRunner::new(&executor, OutputConfig::default());

        let mut skipped = query("old", "SELECT 0");
        skipped.skip = true;
        let mut out: Vec<u8> = Vec::new();
        let summary = runner
            .run(&[skipped, query("new", "SELECT 7 AS n")], &mut out)
            .await
            .unwrap();

        assert_eq!(summary.executed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(service.submitted().len(), 1);
        assert!(service.submitted()[0].sql.ends_with("SELECT 7 AS n"));
    }

    #[tokio::test]
    async fn test_csv_output_per_query() {
        let dir = TempDir::new().unwrap();
        let service = service_with_page();
        let executor = executor(service);
        let output = OutputConfig {
            format: OutputFormat::Csv,
            file: Some(dir.path().join("out.csv")),
        };
        let runner = BatchRunner::new(&executor, output);

        let mut out: Vec<u8> = Vec::new();
        let summary = runner
            .run(&[query("a", "SELECT 1"), query("b", "SELECT 2")], &mut out)
            .await
            .unwrap();

        assert_eq!(summary.total_rows(), 2);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("out_a.csv")).unwrap(),
            "n\n7\n"
        );
        assert!(dir.path().join("out_b.csv").exists());
        assert!(!dir.path().join("out.csv").exists());
        assert!(String::from_utf8(out)
            .unwrap()
            .contains("Query 'a': Results written to"));
    }

    #[tokio::test]
    async fn test_json_single_query_uses_configured_path() {
        let dir = TempDir::new().unwrap();
        let executor = executor(service_with_page());
        let output = OutputConfig {
            format: OutputFormat::Json,
            file: Some(dir.path().join("out.json")),
        };
        let runner = BatchRunner::new(&executor, output);

        runner
            .run(&[query("only", "SELECT 7 AS n")], &mut Vec::<u8>::new())
            .await
            .unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.path().join("out.json")).unwrap())
                .unwrap();
        assert_eq!(value["row_count"], 1);
        assert_eq!(value["rows"][0]["n"], "7");
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let service = service_with_page();
        service.push_state(ExecutionState::Succeeded).push_status(Ok(
            ExecutionStatus::new(ExecutionState::Failed).with_reason("TABLE_NOT_FOUND"),
        ));
        let executor = executor(service.clone());
        let runner = BatchRunner::new(&executor, OutputConfig::default());

        let mut out: Vec<u8> = Vec::new();
        let err = runner
            .run(
                &[
                    query("first", "SELECT 1"),
                    query("second", "SELECT * FROM missing"),
                    query("third", "SELECT 3"),
                ],
                &mut out,
            )
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 3);
        assert!(err.to_string().contains("TABLE_NOT_FOUND"));
        assert_eq!(service.submitted().len(), 2);
        assert!(String::from_utf8(out).unwrap().contains("=== Query: first ==="));
    }

    #[tokio::test]
    async fn test_file_output_error_propagates() {
        let dir = TempDir::new().unwrap();
        let executor = executor(service_with_page());
        let output = OutputConfig {
            format: OutputFormat::Csv,
            file: Some(dir.path().join("missing").join("out.csv")),
        };
        let runner = BatchRunner::new(&executor, output);

        let err = runner
            .run(&[query("q", "SELECT 1")], &mut Vec::<u8>::new())
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), 5);
    }
}
