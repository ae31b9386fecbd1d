//! AWS Athena implementation of [`QueryService`].

use async_trait::async_trait;
use aws_sdk_athena::types::{QueryExecutionContext, ResultConfiguration};
use aws_sdk_athena::Client;
use tracing::debug;

use super::sdk::classify_sdk_error;
use super::types::{
    ExecutionState, ExecutionStatus, RemoteError, RemoteResult, ResultPage, SubmitRequest,
};
use super::QueryService;

/// Query service backed by the Athena API.
#[derive(Debug, Clone)]
pub struct AthenaQueryService {
    client: Client,
}

impl AthenaQueryService {
    /// Creates a service from an existing Athena client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a service from a resolved AWS configuration.
    pub fn from_conf(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(sdk_config))
    }
}

#[async_trait]
impl QueryService for AthenaQueryService {
    async fn submit(&self, request: &SubmitRequest) -> RemoteResult<String> {
        let context = QueryExecutionContext::builder()
            .database(&request.database)
            .build();
        let result_config = ResultConfiguration::builder()
            .output_location(&request.output_location)
            .build();

        let output = self
            .client
            .start_query_execution()
            .query_string(&request.sql)
            .query_execution_context(context)
            .result_configuration(result_config)
            .work_group(&request.workgroup)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        let execution_id = output
            .query_execution_id()
            .ok_or_else(|| RemoteError::other("Response did not include a query execution id"))?;

        debug!("Started query execution {}", execution_id);
        Ok(execution_id.to_string())
    }

    async fn get_status(&self, execution_id: &str) -> RemoteResult<ExecutionStatus> {
        let output = self
            .client
            .get_query_execution()
            .query_execution_id(execution_id)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        let status = output
            .query_execution()
            .and_then(|execution| execution.status())
            .ok_or_else(|| {
                RemoteError::other(format!("No status returned for execution {execution_id}"))
            })?;

        let state = status
            .state()
            .map(|state| ExecutionState::parse(state.as_str()))
            .ok_or_else(|| {
                RemoteError::other(format!("No state returned for execution {execution_id}"))
            })?;

        Ok(ExecutionStatus {
            state,
            state_change_reason: status.state_change_reason().map(String::from),
        })
    }

    async fn get_results(
        &self,
        execution_id: &str,
        next_token: Option<&str>,
    ) -> RemoteResult<ResultPage> {
        let output = self
            .client
            .get_query_results()
            .query_execution_id(execution_id)
            .set_next_token(next_token.map(String::from))
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        let mut page = ResultPage {
            next_token: output.next_token().map(String::from),
            ..Default::default()
        };

        if let Some(result_set) = output.result_set() {
            if let Some(metadata) = result_set.result_set_metadata() {
                page.columns = metadata
                    .column_info()
                    .iter()
                    .map(|column| (column.name().to_string(), column.r#type().to_string()))
                    .collect();
            }

            page.rows = result_set
                .rows()
                .iter()
                .map(|row| {
                    row.data()
                        .iter()
                        .map(|datum| datum.var_char_value().map(String::from))
                        .collect()
                })
                .collect();
        }

        Ok(page)
    }
}
