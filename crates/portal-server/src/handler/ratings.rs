//! Rating passthroughs.

use axum::Router;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use portal_origin::{OriginClient, OriginRequest};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::extract::{AccessCredential, Path, ValidateJson};
use crate::handler::{OriginReply, Result, origin_failure, resource_id};
use crate::service::ServiceState;

/// Rating submitted by the browser.
#[derive(Debug, Serialize, Deserialize, Validate)]
struct RatingRequest {
    /// Whole score from 1 to 10.
    #[validate(range(min = 1, max = 10, message = "Rating must be between 1 and 10"))]
    rating: i64,
}

/// Submits the visitor's rating of an anime.
#[tracing::instrument(skip_all)]
async fn submit_rating(
    State(origin): State<OriginClient>,
    Path(anime_id): Path<String>,
    AccessCredential(token): AccessCredential,
    ValidateJson(request): ValidateJson<RatingRequest>,
) -> Result<Response> {
    let anime_id = resource_id(&anime_id)?;
    let request = OriginRequest::post(format!("/ratings/{anime_id}"))
        .with_bearer(&token)
        .with_json(json!({ "rating": request.rating }));

    Ok(match origin.forward(request).await {
        Ok(response) => OriginReply::from(response).into_response(),
        Err(error) => origin_failure(error),
    })
}

/// Withdraws the visitor's rating of an anime.
#[tracing::instrument(skip_all)]
async fn delete_rating(
    State(origin): State<OriginClient>,
    Path(anime_id): Path<String>,
    AccessCredential(token): AccessCredential,
) -> Result<Response> {
    let anime_id = resource_id(&anime_id)?;
    let request = OriginRequest::delete(format!("/ratings/{anime_id}")).with_bearer(&token);

    Ok(match origin.forward(request).await {
        Ok(response) => OriginReply::from(response).into_response(),
        Err(error) => origin_failure(error),
    })
}

/// Returns a [`Router`] with the rating endpoints.
pub fn routes() -> Router<ServiceState> {
    Router::new().route(
        "/api/ratings/{anime_id}",
        post(submit_rating).delete(delete_rating),
    )
}
