//! Error types shared by the GitHub GraphQL client.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`GithubApiError`] failures.
pub type ApiResult<T> = Result<T, GithubApiError>;

/// Failures that can occur while talking to the GitHub GraphQL API.
#[derive(Debug, Error)]
pub enum GithubApiError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build GitHub client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A GraphQL request could not be sent.
    #[error("failed to send `{operation}` request")]
    RequestSend {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// GitHub's anti-abuse rate limiting rejected the request.
    #[error("`{operation}` hit GitHub's anti-abuse limit; back off before retrying")]
    AbuseLimited { operation: &'static str },
    /// The API returned an unexpected HTTP status code.
    #[error("unexpected response status {status} for `{operation}`")]
    RequestStatus {
        operation: &'static str,
        status: StatusCode,
    },
    /// Response payload could not be parsed into the expected model.
    #[error("failed to decode `{operation}` response")]
    DecodeResponse {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// The API answered 200 but reported GraphQL-level errors.
    #[error("`{operation}` failed: {message}")]
    OperationFailed {
        operation: &'static str,
        message: String,
    },
    /// A field the operation relies on was missing or null.
    #[error("`{operation}` response is missing `{field}`")]
    MissingData {
        operation: &'static str,
        field: &'static str,
    },
}
