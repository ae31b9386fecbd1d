//! Request, response, and error types shared by the remote service adapters.

use std::fmt;
use thiserror::Error;

/// Error codes the query and storage services use for rate limiting.
const THROTTLING_CODES: &[&str] = &[
    "ThrottlingException",
    "TooManyRequestsException",
    "ProvisionedThroughputExceededException",
    "RequestLimitExceeded",
    "Throttling",
    "SlowDown",
];

/// Error codes for server-side faults that are not always reported as 5xx.
const SERVER_FAULT_CODES: &[&str] = &[
    "ServiceUnavailable",
    "InternalServerError",
    "InternalServerException",
    "InternalFailure",
];

/// Classification of a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connect or read timeout.
    Timeout,
    /// Rate limiting or request-limit rejection.
    Throttled,
    /// 5xx status or a service-unavailable/internal-error code.
    ServerError,
    /// 4xx status: malformed request, access denied, missing resource.
    ClientError,
    /// Anything not recognised above.
    Other,
}

impl ErrorKind {
    /// Returns true if a retry is likely to succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Throttled | Self::ServerError)
    }

    /// Classifies a service response from its error code and HTTP status.
    pub fn from_response(code: Option<&str>, http_status: Option<u16>) -> Self {
        if let Some(code) = code {
            if THROTTLING_CODES.contains(&code) {
                return Self::Throttled;
            }
        }

        if matches!(http_status, Some(500..=599)) {
            return Self::ServerError;
        }

        if let Some(code) = code {
            if SERVER_FAULT_CODES.contains(&code) {
                return Self::ServerError;
            }
        }

        if matches!(http_status, Some(400..=499)) {
            return Self::ClientError;
        }

        Self::Other
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Throttled => "throttled",
            Self::ServerError => "server error",
            Self::ClientError => "client error",
            Self::Other => "error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed remote call, classified at the adapter boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RemoteError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RemoteError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn throttled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Throttled, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServerError, message)
    }

    pub fn client(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ClientError, message)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Other, message)
    }

    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

/// Result type for remote calls.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Everything the query service needs to start an execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    /// Query text as submitted, including any comment prefix.
    pub sql: String,
    pub database: String,
    pub output_location: String,
    pub workgroup: String,
}

/// Lifecycle state of a remote execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
    /// A state string this client does not know about; treated as non-terminal.
    Unknown(String),
}

impl ExecutionState {
    /// Parses the service's state string.
    pub fn parse(s: &str) -> Self {
        match s {
            "QUEUED" => Self::Queued,
            "RUNNING" => Self::Running,
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            "CANCELLED" => Self::Cancelled,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Unknown(s) => s,
        }
    }

    /// Returns true once no further transitions can occur.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of an execution plus the service's explanation for the last change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionStatus {
    pub state: ExecutionState,
    pub state_change_reason: Option<String>,
}

impl ExecutionStatus {
    pub fn new(state: ExecutionState) -> Self {
        Self {
            state,
            state_change_reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.state_change_reason = Some(reason.into());
        self
    }
}

/// One page of a result set as returned by the service.
///
/// Fields are `None` where the service sent no value marker (SQL NULL).
/// Column metadata is only meaningful on the first page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPage {
    /// `(name, type)` pairs.
    pub columns: Vec<(String, String)>,
    pub rows: Vec<Vec<Option<String>>>,
    pub next_token: Option<String>,
}
