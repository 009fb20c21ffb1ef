use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// HTTP error response representation.
///
/// Serialized inside an `error` envelope so browsers see the same shape as
/// the origin's own failures.
#[must_use = "error responses do nothing unless serialized"]
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse<'a> {
    /// The error name/type identifier.
    pub name: Cow<'a, str>,
    /// User-friendly error message safe for client display.
    pub message: Cow<'a, str>,
    /// Additional detail for debugging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Cow<'a, str>>,
    /// HTTP status code (not serialized in JSON).
    #[serde(skip)]
    pub status: StatusCode,
}

#[derive(Serialize)]
struct Envelope<'r, 'a> {
    error: &'r ErrorResponse<'a>,
}

impl<'a> ErrorResponse<'a> {
    // 4xx Client Errors
    pub const BAD_REQUEST: Self = Self::new(
        "bad_request",
        "The request could not be processed due to invalid data",
        StatusCode::BAD_REQUEST,
    );
    pub const MISSING_AUTH_TOKEN: Self = Self::new(
        "missing_auth_token",
        "Not authenticated",
        StatusCode::UNAUTHORIZED,
    );
    pub const NOT_FOUND: Self = Self::new(
        "not_found",
        "The requested resource was not found",
        StatusCode::NOT_FOUND,
    );
    pub const UNAUTHORIZED: Self = Self::new(
        "unauthorized",
        "Invalid or expired authentication credentials",
        StatusCode::UNAUTHORIZED,
    );

    // 5xx Server Errors
    pub const BAD_GATEWAY: Self = Self::new(
        "bad_gateway",
        "The origin service is unreachable",
        StatusCode::BAD_GATEWAY,
    );
    pub const GATEWAY_TIMEOUT: Self = Self::new(
        "gateway_timeout",
        "The request took too long to process",
        StatusCode::GATEWAY_TIMEOUT,
    );
    pub const INTERNAL_SERVER_ERROR: Self = Self::new(
        "internal_server_error",
        "An internal server error occurred. Please try again later",
        StatusCode::INTERNAL_SERVER_ERROR,
    );
    pub const SERVICE_UNAVAILABLE: Self = Self::new(
        "service_unavailable",
        "The session could not be refreshed right now. Please try again",
        StatusCode::SERVICE_UNAVAILABLE,
    );

    /// Creates a new error response.
    #[inline]
    pub const fn new(name: &'a str, message: &'a str, status: StatusCode) -> Self {
        Self {
            name: Cow::Borrowed(name),
            message: Cow::Borrowed(message),
            context: None,
            status,
        }
    }

    /// Replaces the message.
    pub fn with_message(mut self, message: impl Into<Cow<'a, str>>) -> Self {
        self.message = message.into();
        self
    }

    /// Attaches context to the error response.
    /// If context already exists, it merges them with a separator.
    pub fn with_context(mut self, context: impl Into<Cow<'a, str>>) -> Self {
        let new_context = context.into();
        self.context = Some(match self.context {
            Some(existing) => Cow::Owned(format!("{}; {}", existing, new_context)),
            None => new_context,
        });
        self
    }
}

impl Default for ErrorResponse<'_> {
    #[inline]
    fn default() -> Self {
        Self::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ErrorResponse<'_> {
    #[inline]
    fn into_response(self) -> Response {
        (self.status, Json(Envelope { error: &self })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_is_replaced() {
        let response = ErrorResponse::MISSING_AUTH_TOKEN.with_message("No refresh token");
        assert_eq!(&response.message, "No refresh token");
    }

    #[test]
    fn context_is_merged() {
        let response = ErrorResponse::BAD_GATEWAY
            .with_context("connect failed")
            .with_context("retried twice");

        assert_eq!(
            response.context.as_deref(),
            Some("connect failed; retried twice")
        );
    }

    #[test]
    fn serialized_inside_error_envelope() {
        let response = ErrorResponse::BAD_REQUEST.with_message("Rating must be between 1 and 10");
        let json = serde_json::to_value(Envelope { error: &response }).unwrap();

        assert_eq!(json["error"]["name"], "bad_request");
        assert_eq!(json["error"]["message"], "Rating must be between 1 and 10");
        assert!(json["error"].get("status").is_none());
        assert!(json["error"].get("context").is_none());
    }
}
