//! Error types for athena-query.
//!
//! Defines the main error enum used throughout the application.

use thiserror::Error;

/// Main error type for athena-query operations.
#[derive(Error, Debug)]
pub enum AthenaQueryError {
    /// Configuration errors (missing file, invalid TOML, missing required fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential resolution errors (no provider, unknown profile, partial keys, etc.)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Query errors (submission, polling, terminal failure, result retrieval)
    #[error("Query error: {0}")]
    QueryExecution(String),

    /// Result sink errors (CSV/JSON file could not be written)
    #[error("File output error: {0}")]
    FileOutput(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AthenaQueryError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an authentication error with the given message.
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Creates a query execution error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::QueryExecution(msg.into())
    }

    /// Creates a file output error with the given message.
    pub fn file_output(msg: impl Into<String>) -> Self {
        Self::FileOutput(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "Configuration Error",
            Self::Authentication(_) => "Authentication Error",
            Self::QueryExecution(_) => "Query Error",
            Self::FileOutput(_) => "File Output Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the process exit code the CLI reports for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 1,
            Self::Authentication(_) => 2,
            Self::QueryExecution(_) => 3,
            Self::Internal(_) => 4,
            Self::FileOutput(_) => 5,
        }
    }
}

/// Result type alias using AthenaQueryError.
pub type Result<T> = std::result::Result<T, AthenaQueryError>;
