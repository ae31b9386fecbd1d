//! athena-query - Run batches of SQL queries against AWS Athena.

use std::io::Write;
use std::sync::Arc;

use athena_query::auth::resolve_aws_config;
use athena_query::cli::Cli;
use athena_query::config::Config;
use athena_query::error::{AthenaQueryError, Result};
use athena_query::logging::init_logging;
use athena_query::query::QueryExecutor;
use athena_query::remote::{AthenaQueryService, S3ObjectStore};
use athena_query::runner::BatchRunner;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    // Credentials may come from a local .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    init_logging(cli.debug);

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!(
        "Starting athena-query with config: {}",
        cli.config.display()
    );

    let mut config = Config::load_from_file(&cli.config)?;
    cli.apply_overrides(&mut config)?;
    info!(
        "Configuration loaded successfully: {} queries found",
        config.queries.len()
    );

    let sdk_config = resolve_aws_config(config.aws.profile.as_deref(), &config.aws.region).await?;

    let service = Arc::new(AthenaQueryService::from_conf(&sdk_config));
    debug!("Athena client created");

    let object_store = Arc::new(S3ObjectStore::from_conf(&sdk_config));
    let executor = QueryExecutor::from_config(&config, service, object_store);

    let runner = BatchRunner::new(&executor, config.output.clone());
    let mut stdout = std::io::stdout().lock();
    let summary = runner.run(&config.queries, &mut stdout).await?;
    stdout
        .flush()
        .map_err(|e| AthenaQueryError::internal(format!("Failed to flush stdout: {e}")))?;

    debug!(
        "Batch finished: {} executed, {} skipped, {} rows",
        summary.executed,
        summary.skipped,
        summary.total_rows()
    );
    Ok(())
}
