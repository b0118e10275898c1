// ABOUTME: Error taxonomy for container lifecycle operations, SNAFU style.
// ABOUTME: Separates absence, transport, remote rejection, timeouts and stale snapshots.

use snafu::Snafu;
use std::time::Duration;

use crate::client::{ClientError, Response};
use crate::types::StatusCode;

/// Errors surfaced by the container proxy and registry.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("container not found: {name} ({detail})"))]
    NotFound { name: String, detail: String },

    #[snafu(display("transport failure: {source}"))]
    Transport { source: ClientError },

    #[snafu(display("request rejected by server ({code}): {message}"))]
    RemoteRejected { code: u16, message: String },

    #[snafu(display("operation {operation} finished as {status}: {message}"))]
    OperationFailed {
        operation: String,
        status: StatusCode,
        message: String,
    },

    #[snafu(display("operation {operation} is no longer known to the server"))]
    OperationLost { operation: String },

    #[snafu(display("{operation} did not finish within {waited:?}"))]
    OperationTimeout { operation: String, waited: Duration },

    #[snafu(display("container {name} changed on the server since it was last fetched"))]
    StaleState { name: String },

    #[snafu(display("unknown state action: {action}"))]
    InvalidAction { action: String },

    #[snafu(display("invalid {action} request: {reason}"))]
    InvalidTransition { action: String, reason: String },

    #[snafu(display("container {name} has no local changes to update"))]
    NotModified { name: String },

    #[snafu(display("failed to encode container document: {source}"))]
    Encode { source: serde_json::Error },

    #[snafu(display("malformed response: {message}"))]
    MalformedResponse { message: String },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The resource does not exist. Expected in normal control flow.
    NotFound,
    /// The server could not be reached or sent something undecodable. Retryable.
    Transport,
    /// The server refused the request or the operation it started failed.
    RemoteRejected,
    /// A background operation did not finish before the deadline.
    OperationTimeout,
    /// A guarded update lost a race with a concurrent change.
    StaleState,
    /// The request was refused locally before anything was sent.
    InvalidRequest,
}

impl Error {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Transport { .. } | Error::MalformedResponse { .. } => ErrorKind::Transport,
            Error::RemoteRejected { .. }
            | Error::OperationFailed { .. }
            | Error::OperationLost { .. } => ErrorKind::RemoteRejected,
            Error::OperationTimeout { .. } => ErrorKind::OperationTimeout,
            Error::StaleState { .. } => ErrorKind::StaleState,
            Error::InvalidAction { .. }
            | Error::InvalidTransition { .. }
            | Error::NotModified { .. }
            | Error::Encode { .. } => ErrorKind::InvalidRequest,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Transport | ErrorKind::OperationTimeout
        )
    }

    /// The error detail reported by the server, if this error came from one.
    pub fn remote_detail(&self) -> Option<&str> {
        match self {
            Error::NotFound { detail, .. } => Some(detail),
            Error::RemoteRejected { message, .. } | Error::OperationFailed { message, .. } => {
                Some(message)
            }
            _ => None,
        }
    }

    /// Classify an error envelope returned for `subject`.
    pub(crate) fn from_envelope(response: &Response, subject: &str) -> Self {
        if response.is_not_found() {
            return Error::NotFound {
                name: subject.to_string(),
                detail: response.error.clone(),
            };
        }
        if response.error_code == 412 {
            return Error::StaleState {
                name: subject.to_string(),
            };
        }
        Error::RemoteRejected {
            code: response.error_code,
            message: response.error.clone(),
        }
    }
}

impl From<ClientError> for Error {
    fn from(source: ClientError) -> Self {
        Error::Transport { source }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
