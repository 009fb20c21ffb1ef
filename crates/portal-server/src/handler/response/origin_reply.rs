use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use portal_origin::OriginResponse;
use serde_json::Value;

/// An origin answer relayed to the browser without reshaping.
#[must_use]
#[derive(Debug, Clone)]
pub struct OriginReply {
    status: StatusCode,
    body: Option<Value>,
}

impl OriginReply {
    pub fn new(status: StatusCode, body: Option<Value>) -> Self {
        Self { status, body }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<OriginResponse> for OriginReply {
    fn from(response: OriginResponse) -> Self {
        Self::new(response.status, response.body)
    }
}

impl IntoResponse for OriginReply {
    fn into_response(self) -> Response {
        match self.body {
            Some(body) if self.status != StatusCode::NO_CONTENT => {
                (self.status, Json(body)).into_response()
            }
            _ => self.status.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn no_content_has_no_body() {
        let response = OriginReply::new(StatusCode::NO_CONTENT, None).into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[test]
    fn status_is_kept() {
        let reply = OriginReply::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            Some(json!({ "error": { "message": "bad position" } })),
        );
        assert_eq!(reply.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            reply.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
