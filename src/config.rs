//! Configuration management for athena-query.
//!
//! Handles loading the TOML run file: AWS session settings, Athena execution
//! settings, output format, the execution cache, retry policy, and the list of
//! queries to run.

use crate::error::{AthenaQueryError, Result};
use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// AWS session settings.
    #[serde(default)]
    pub aws: AwsConfig,

    /// Athena execution settings.
    pub athena: AthenaConfig,

    /// Result output settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Execution cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Comment prefix added to submitted SQL.
    #[serde(default)]
    pub query_prefix: QueryPrefixConfig,

    /// Retry policy for remote calls.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Queries to run, in order.
    #[serde(default)]
    pub queries: Vec<QueryConfig>,
}

/// AWS session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Named profile from the shared config files.
    pub profile: Option<String>,

    /// AWS region.
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            profile: None,
            region: default_region(),
        }
    }
}

/// Athena execution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AthenaConfig {
    /// Database queries run against.
    #[serde(default)]
    pub database: String,

    /// Workgroup queries are submitted to.
    #[serde(default)]
    pub workgroup: String,

    /// S3 prefix Athena writes results under (e.g., "s3://bucket/athena-results/").
    #[serde(default)]
    pub output_location: String,

    /// Delay between status polls, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

impl AthenaConfig {
    pub fn new(
        database: impl Into<String>,
        workgroup: impl Into<String>,
        output_location: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            workgroup: workgroup.into(),
            output_location: output_location.into(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Result output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// ASCII table on stdout.
    #[default]
    Table,
    /// CSV file.
    Csv,
    /// JSON file.
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Returns true if this format writes to a file rather than stdout.
    pub fn needs_file(&self) -> bool {
        matches!(self, Self::Csv | Self::Json)
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid output format: '{s}'. Must be one of: table, csv, json"
            )),
        }
    }
}

/// Result output configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Output file path for csv/json output.
    pub file: Option<PathBuf>,
}

impl OutputConfig {
    /// Checks that file-based formats have a file to write to.
    pub fn validate(&self) -> Result<()> {
        if self.format.needs_file() && self.file.is_none() {
            return Err(AthenaQueryError::config(format!(
                "{} output format requires 'output.file' to be specified",
                self.format.as_str().to_uppercase()
            )));
        }
        Ok(())
    }
}

/// Execution cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Maximum age of a reusable execution, in seconds.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,

    /// Directory holding one record per execution.
    #[serde(default = "default_cache_directory")]
    pub directory: PathBuf,
}

fn default_ttl_seconds() -> u64 {
    3600
}

fn default_cache_directory() -> PathBuf {
    PathBuf::from(".athena_cache")
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl_seconds: default_ttl_seconds(),
            directory: default_cache_directory(),
        }
    }
}

/// SQL comment prefix configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPrefixConfig {
    /// Tool identifier written into the leading comment of every submitted query.
    #[serde(default = "default_tool_name")]
    pub tool_name: String,
}

fn default_tool_name() -> String {
    "athena-query".to_string()
}

impl Default for QueryPrefixConfig {
    fn default() -> Self {
        Self {
            tool_name: default_tool_name(),
        }
    }
}

/// Retry configuration for remote calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds. Doubles on each retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// Builds the retry policy these settings describe.
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }
}

/// A named query to run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub sql: String,

    /// Skip this query without removing it from the file.
    #[serde(default)]
    pub skip: bool,
}

impl Config {
    /// Loads and validates configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AthenaQueryError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AthenaQueryError::config(format!(
                "Error reading configuration file {}: {e}",
                path.display()
            ))
        })?;

        Self::parse_toml(&content, path)
    }

    /// Parses and validates configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            AthenaQueryError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks required fields and value ranges.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("database", &self.athena.database),
            ("workgroup", &self.athena.workgroup),
            ("output_location", &self.athena.output_location),
        ] {
            if value.trim().is_empty() {
                return Err(AthenaQueryError::config(format!(
                    "Field 'athena.{field}' must be a non-empty string"
                )));
            }
        }

        if self.athena.poll_interval_ms == 0 {
            return Err(AthenaQueryError::config(
                "Field 'athena.poll_interval_ms' must be greater than 0",
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(AthenaQueryError::config(
                "Field 'retry.max_attempts' must be at least 1",
            ));
        }
        if self.retry.base_delay_ms == 0 {
            return Err(AthenaQueryError::config(
                "Field 'retry.base_delay_ms' must be greater than 0",
            ));
        }

        if self.query_prefix.tool_name.trim().is_empty() {
            return Err(AthenaQueryError::config(
                "Field 'query_prefix.tool_name' must be a non-empty string",
            ));
        }

        self.output.validate()?;

        if self.queries.is_empty() {
            return Err(AthenaQueryError::config(
                "Field 'queries' must contain at least one query",
            ));
        }
        for (i, query) in self.queries.iter().enumerate() {
            if query.name.trim().is_empty() {
                return Err(AthenaQueryError::config(format!(
                    "Query at index {i}: field 'name' must be a non-empty string"
                )));
            }
            if query.sql.trim().is_empty() {
                return Err(AthenaQueryError::config(format!(
                    "Query at index {i}: field 'sql' must be a non-empty string"
                )));
            }
        }

        Ok(())
    }
}
