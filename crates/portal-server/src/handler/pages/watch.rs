use axum::extract::State;
use portal_origin::{OriginClient, OriginRequest};

use super::load_section;
use crate::extract::{CurrentSession, Json, Path};
use crate::handler::response::WatchPage;
use crate::handler::{Result, resource_id};

/// Loads the subtitled sources of an episode.
///
/// The access gate keeps anonymous visitors away from this route.
#[tracing::instrument(skip_all)]
pub(super) async fn watch(
    State(origin): State<OriginClient>,
    CurrentSession(session): CurrentSession,
    Path(episode_id): Path<String>,
) -> Result<Json<WatchPage>> {
    let episode_id = resource_id(&episode_id)?;

    let sources = match session.access_token() {
        Some(token) => {
            let request = OriginRequest::get(format!("/watch/{episode_id}"))
                .with_query("category", "sub")
                .with_bearer(token);
            load_section(&origin, request).await
        }
        None => None,
    };

    Ok(Json(WatchPage {
        user: session.identity().cloned(),
        episode_id: episode_id.to_owned(),
        sources,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::http::header::{COOKIE, LOCATION};
    use serde_json::Value;

    use crate::testing::{FakeOrigin, cookie_header};

    #[tokio::test]
    async fn watch_loads_subtitled_sources() -> anyhow::Result<()> {
        let origin = FakeOrigin::spawn().await?;
        let server = origin.gateway()?;

        let response = server
            .get("/watch/ep-7")
            .add_header(COOKIE, cookie_header(Some(FakeOrigin::VALID_ACCESS), None))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["episode_id"], "ep-7");
        assert_eq!(body["sources"]["category"], "sub");
        assert_eq!(body["user"]["user_id"], FakeOrigin::USER_ID);
        Ok(())
    }

    #[tokio::test]
    async fn anonymous_watch_is_redirected() -> anyhow::Result<()> {
        let origin = FakeOrigin::spawn().await?;
        let server = origin.gateway()?;

        let response = server.get("/watch/ep-7").await;

        response.assert_status(StatusCode::FOUND);
        assert_eq!(
            response.header(LOCATION),
            "/login?return=%2Fwatch%2Fep-7"
        );
        Ok(())
    }
}
