use axum::response::{IntoResponse, Response};

use crate::handler::response::OriginReply;
use crate::handler::{Error, ErrorKind};

impl From<portal_origin::Error> for Error<'static> {
    fn from(err: portal_origin::Error) -> Self {
        use portal_origin::Error as OriginError;

        match err {
            OriginError::Unreachable(ref source) if source.is_timeout() => ErrorKind::BadGateway
                .with_message("The origin service did not answer in time")
                .with_context(err.to_string()),
            OriginError::Unreachable(_) => ErrorKind::BadGateway
                .with_message("The origin service is unreachable")
                .with_context(err.to_string()),
            OriginError::Decode(_) => ErrorKind::BadGateway
                .with_message("The origin service returned an invalid response")
                .with_context(err.to_string()),
            OriginError::Rejected { status, .. } => ErrorKind::BadGateway
                .with_message("The origin service rejected the request")
                .with_context(format!("status {status}")),
            OriginError::Config(_) => ErrorKind::InternalServerError.with_context(err.to_string()),
        }
    }
}

/// Turns a failed origin call into the response the browser receives.
///
/// A received rejection is relayed with its status and body; anything else
/// becomes a gateway error.
pub(crate) fn origin_failure(err: portal_origin::Error) -> Response {
    match err {
        portal_origin::Error::Rejected { status, body } => {
            OriginReply::new(status, body).into_response()
        }
        other => Error::from(other).into_response(),
    }
}
