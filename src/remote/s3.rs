//! AWS S3 implementation of [`ObjectStore`].

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::Client;

use super::sdk::{classify_sdk_error, http_status};
use super::types::RemoteResult;
use super::ObjectStore;

/// Object store backed by S3 `HeadObject`.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Creates a store from an existing S3 client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a store from a resolved AWS configuration.
    pub fn from_conf(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(sdk_config))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn head_exists(&self, bucket: &str, key: &str) -> RemoteResult<bool> {
        match self.client.head_object().bucket(bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(err) => missing_or_error(&err),
        }
    }
}

/// Maps a failed `HeadObject` call: not found is `Ok(false)`, anything else is classified.
fn missing_or_error(err: &SdkError<HeadObjectError, HttpResponse>) -> RemoteResult<bool> {
    // HeadObject has no body, so a missing key often arrives as a bare 404.
    let not_found = err
        .as_service_error()
        .map(|service_err| service_err.is_not_found())
        .unwrap_or(false);
    if not_found || http_status(err) == Some(404) {
        return Ok(false);
    }
    Err(classify_sdk_error(err))
}
