use axum::extract::State;
use axum::http::StatusCode;
use portal_origin::{OriginClient, OriginRequest};

use super::{load_section, take_items};
use crate::TRACING_TARGET_HANDLER;
use crate::extract::{CurrentSession, Json, Path};
use crate::handler::response::AnimePage;
use crate::handler::{Result, resource_id};

/// Loads a title with its episodes and ratings in parallel.
///
/// Ratings carry the visitor's own score when they are signed in.
#[tracing::instrument(skip_all)]
pub(super) async fn anime(
    State(origin): State<OriginClient>,
    CurrentSession(session): CurrentSession,
    Path(anime_id): Path<String>,
) -> Result<Json<AnimePage>> {
    let anime_id = resource_id(&anime_id)?;

    let ratings = OriginRequest::get(format!("/ratings/{anime_id}"))
        .with_optional_bearer(session.access_token());
    let (anime, episodes, ratings) = tokio::join!(
        origin.forward(OriginRequest::get(format!("/anime/{anime_id}"))),
        load_section(&origin, OriginRequest::get(format!("/anime/{anime_id}/episodes"))),
        load_section(&origin, ratings),
    );

    let user = session.identity().cloned();
    let error = match anime {
        Ok(response) if response.is_success() => {
            return Ok(Json(AnimePage {
                user,
                anime: response.body,
                episodes: take_items(episodes, "episodes"),
                ratings,
                error: None,
            }));
        }
        Ok(response) if response.status == StatusCode::NOT_FOUND => "Anime not found",
        Ok(response) => {
            tracing::warn!(
                target: TRACING_TARGET_HANDLER,
                anime_id = %anime_id,
                status = %response.status,
                "origin refused anime"
            );
            "Failed to load anime"
        }
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET_HANDLER,
                anime_id = %anime_id,
                error = %error,
                "anime unavailable"
            );
            "Failed to load anime"
        }
    };

    Ok(Json(AnimePage {
        user,
        error: Some(error),
        ..AnimePage::default()
    }))
}
