//! HTTP front end for ad-hoc queries.
//!
//! Exposes two JSON endpoints over one shared [`QueryExecutor`]:
//! `GET /api/config` reports the connection settings and `POST /api/query`
//! runs a single statement. Every response carries a `success` flag.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::AthenaQueryError;
use crate::query::{Column, QueryExecutor, QueryRequest, Row};

/// Shared state behind every route.
pub struct AppState {
    executor: QueryExecutor,
    settings: ConnectionInfo,
}

impl AppState {
    pub fn new(config: &Config, executor: QueryExecutor) -> Self {
        Self {
            executor,
            settings: ConnectionInfo {
                region: config.aws.region.clone(),
                database: config.athena.database.clone(),
                workgroup: config.athena.workgroup.clone(),
            },
        }
    }
}

/// Builds the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/config", get(get_config))
        .route("/api/query", post(execute_query))
        .with_state(state)
}

#[derive(Debug, Clone, Serialize)]
struct ConnectionInfo {
    region: String,
    database: String,
    workgroup: String,
}

#[derive(Serialize)]
struct Success<T> {
    success: bool,
    data: T,
}

impl<T: Serialize> Success<T> {
    fn json(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

#[derive(Serialize)]
struct QueryData {
    columns: Vec<Column>,
    rows: Vec<Row>,
    row_count: usize,
    from_cache: bool,
}

/// An error response: `{"success": false, "error": ...}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
struct Failure {
    success: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Failure {
            success: false,
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AthenaQueryError> for ApiError {
    fn from(err: AthenaQueryError) -> Self {
        match err {
            AthenaQueryError::Authentication(message) => {
                warn!("Authentication error: {}", message);
                Self {
                    status: StatusCode::UNAUTHORIZED,
                    message,
                }
            }
            AthenaQueryError::QueryExecution(message) => {
                warn!("Query error: {}", message);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message,
                }
            }
            other => {
                error!("{}: {}", other.category(), other);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Internal server error".to_string(),
                }
            }
        }
    }
}

async fn get_config(State(state): State<Arc<AppState>>) -> Json<Success<ConnectionInfo>> {
    Success::json(state.settings.clone())
}

async fn execute_query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<Success<QueryData>>, ApiError> {
    let Json(body) = payload.map_err(|_| ApiError::bad_request("Request must be JSON"))?;

    let sql = body
        .get("sql")
        .and_then(|v| v.as_str())
        .filter(|sql| !sql.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing or empty 'sql' field"))?;

    info!("Executing ad-hoc query");
    let outcome = state.executor.execute_detailed(&QueryRequest::new(sql)).await?;
    info!(
        "Query completed: {} rows returned{}",
        outcome.result.row_count,
        if outcome.from_cache { " (cached)" } else { "" }
    );

    let result = outcome.result;
    Ok(Success::json(QueryData {
        columns: result.columns,
        rows: result.rows,
        row_count: result.row_count,
        from_cache: outcome.from_cache,
    }))
}
