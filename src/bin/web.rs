//! athena-query-web - Serve ad-hoc Athena queries over HTTP.

use std::sync::Arc;

use athena_query::auth::resolve_aws_config;
use athena_query::cli::WebCli;
use athena_query::config::Config;
use athena_query::error::{AthenaQueryError, Result};
use athena_query::logging::init_logging;
use athena_query::query::QueryExecutor;
use athena_query::remote::{AthenaQueryService, S3ObjectStore};
use athena_query::web::{router, AppState};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = WebCli::parse_args();
    init_logging(cli.debug);

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: WebCli) -> Result<()> {
    let config = Config::load_from_file(&cli.config)?;
    let sdk_config = resolve_aws_config(config.aws.profile.as_deref(), &config.aws.region).await?;

    let service = Arc::new(AthenaQueryService::from_conf(&sdk_config));
    let object_store = Arc::new(S3ObjectStore::from_conf(&sdk_config));
    let executor = QueryExecutor::from_config(&config, service, object_store);
    let app = router(Arc::new(AppState::new(&config, executor)));

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .map_err(|e| AthenaQueryError::internal(format!("Failed to bind {}: {e}", cli.bind)))?;
    info!("Listening on http://{}", cli.bind);

    axum::serve(listener, app)
        .await
        .map_err(|e| AthenaQueryError::internal(format!("Server error: {e}")))
}
