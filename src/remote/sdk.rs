//! Maps AWS SDK errors onto [`RemoteError`].

use aws_sdk_athena::config::http::HttpResponse;
use aws_sdk_athena::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

use super::types::{ErrorKind, RemoteError};

/// Classifies an SDK error from any AWS service client.
pub(crate) fn classify_sdk_error<E>(err: &SdkError<E, HttpResponse>) -> RemoteError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    let message = DisplayErrorContext(err).to_string();

    let kind = match err {
        SdkError::TimeoutError(_) => ErrorKind::Timeout,
        SdkError::DispatchFailure(failure) if failure.is_timeout() => ErrorKind::Timeout,
        SdkError::ServiceError(context) => ErrorKind::from_response(
            context.err().code(),
            Some(context.raw().status().as_u16()),
        ),
        SdkError::ResponseError(context) => {
            ErrorKind::from_response(None, Some(context.raw().status().as_u16()))
        }
        _ => ErrorKind::Other,
    };

    RemoteError::new(kind, message)
}

/// Returns the HTTP status of the raw response, if one was received.
pub(crate) fn http_status<E>(err: &SdkError<E, HttpResponse>) -> Option<u16> {
    err.raw_response().map(|response| response.status().as_u16())
}
