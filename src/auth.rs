//! AWS session resolution.
//!
//! Builds the shared SDK configuration from the default provider chain
//! (environment, shared config files, optional named profile, instance role)
//! and resolves credentials up front so a missing or broken setup surfaces
//! as an authentication error before any query is submitted.

use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, ConfigLoader, Region, SdkConfig};
use aws_credential_types::provider::error::CredentialsError;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_athena::error::DisplayErrorContext;
use tracing::{debug, info};

use crate::error::{AthenaQueryError, Result};

const NO_CREDENTIALS: &str = "No valid AWS credentials found. Please configure credentials using one of:\n  \
1. Environment variables (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY)\n  \
2. AWS credentials file (~/.aws/credentials)\n  \
3. IAM role (when running on AWS infrastructure)\n  \
4. AWS profile (specify in configuration)";

/// Loads the SDK configuration for `region` and verifies credentials resolve.
pub async fn resolve_aws_config(profile: Option<&str>, region: &str) -> Result<SdkConfig> {
    let config = config_loader(profile, region).load().await;

    let provider = config
        .credentials_provider()
        .ok_or_else(|| AthenaQueryError::authentication(NO_CREDENTIALS))?;
    provider
        .provide_credentials()
        .await
        .map_err(|e| AthenaQueryError::authentication(credentials_error_message(&e, profile)))?;

    info!("AWS session created successfully (region: {})", region);
    Ok(config)
}

/// Builds the loader for the default provider chain.
///
/// SDK-level retries are disabled: [`RetryPolicy`](crate::retry::RetryPolicy)
/// is the only retry layer around remote calls.
fn config_loader(profile: Option<&str>, region: &str) -> ConfigLoader {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .retry_config(RetryConfig::disabled());
    if let Some(profile) = profile {
        debug!("Using AWS profile: {}", profile);
        loader = loader.profile_name(profile);
    }
    loader
}

/// Explains a credential resolution failure in terms of what the user can fix.
fn credentials_error_message(err: &CredentialsError, profile: Option<&str>) -> String {
    let detail = DisplayErrorContext(err);
    match (err, profile) {
        (CredentialsError::CredentialsNotLoaded(_), None) => NO_CREDENTIALS.to_string(),
        (CredentialsError::CredentialsNotLoaded(_), Some(profile))
        | (CredentialsError::InvalidConfiguration(_), Some(profile)) => format!(
            "AWS profile '{profile}' could not be used. Please check your AWS configuration \
             file (~/.aws/config): {detail}"
        ),
        (CredentialsError::InvalidConfiguration(_), None) => {
            format!("Incomplete or invalid AWS credentials: {detail}")
        }
        _ => format!("Failed to create AWS session: {detail}"),
    }
}
