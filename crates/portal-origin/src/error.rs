//! Error types for origin calls.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Result type alias for portal-origin operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error returned by [`OriginClient`](crate::OriginClient) calls.
///
/// The variants separate calls that never produced a response from calls
/// the origin answered with a failure status.
#[derive(Debug, Error)]
pub enum Error {
    /// No response was received: connect failure, timeout, or a body that
    /// could not be read to the end.
    #[error("origin unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// The origin answered with a non-2xx status.
    #[error("origin rejected the request with status {status}")]
    Rejected {
        /// Status code returned by the origin.
        status: StatusCode,
        /// JSON body returned by the origin, if it sent one.
        body: Option<Value>,
    },

    /// The origin answered with 2xx but the body did not match the contract.
    #[error("invalid origin response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The HTTP client could not be constructed or a request URL could not
    /// be formed.
    #[error("invalid origin client configuration: {0}")]
    Config(String),
}

impl Error {
    /// Returns the status code of a received failure response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the origin answered `401 Unauthorized`.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    /// Returns `true` if the origin answered with a 5xx status.
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|status| status.is_server_error())
    }

    /// Returns `true` if no response was received at all.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }

    /// Returns `true` if the failure came from a timed out request.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Unreachable(err) if err.is_timeout())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Unreachable(err)
    }
}
