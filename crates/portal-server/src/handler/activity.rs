//! Watch-progress passthrough.

use axum::Router;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use portal_origin::{OriginClient, OriginRequest};
use serde_json::Value;

use crate::extract::{AccessCredential, Json};
use crate::handler::{OriginReply, origin_failure};
use crate::service::ServiceState;

/// Forwards a progress report with the session's access token.
#[tracing::instrument(skip_all)]
async fn save_progress(
    State(origin): State<OriginClient>,
    AccessCredential(token): AccessCredential,
    Json(body): Json<Value>,
) -> Response {
    let request = OriginRequest::post("/activity/progress")
        .with_bearer(&token)
        .with_json(body);

    match origin.forward(request).await {
        Ok(response) => OriginReply::from(response).into_response(),
        Err(error) => origin_failure(error),
    }
}

/// Returns a [`Router`] with the activity endpoints.
pub fn routes() -> Router<ServiceState> {
    Router::new().route("/api/activity/progress", post(save_progress))
}
