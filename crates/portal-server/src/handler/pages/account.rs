use axum::extract::State;
use portal_origin::{OriginClient, OriginRequest};
use serde::Deserialize;

use super::{load_section, take_items};
use crate::extract::{CurrentSession, Json, Query};
use crate::handler::response::{AuthPage, ProfilePage, UserResponse};

/// Continue-watching entries on the profile page.
const CONTINUE_LIMIT: u32 = 20;

/// `?return=` target of the login and registration pages.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct ReturnTo {
    #[serde(rename = "return")]
    target: Option<String>,
}

impl ReturnTo {
    /// Returns the target when it stays on this site, `/` otherwise.
    fn local_path(self) -> String {
        match self.target {
            Some(target)
                if target.starts_with('/')
                    && !target.starts_with("//")
                    && !target.contains('\\') =>
            {
                target
            }
            _ => "/".to_owned(),
        }
    }
}

#[tracing::instrument(skip_all)]
pub(super) async fn profile(
    State(origin): State<OriginClient>,
    CurrentSession(session): CurrentSession,
) -> Json<ProfilePage> {
    let continue_watching = match session.access_token() {
        Some(token) => {
            let request = OriginRequest::get("/activity/continue")
                .with_query("limit", CONTINUE_LIMIT)
                .with_bearer(token);
            take_items(load_section(&origin, request).await, "items")
        }
        None => Vec::new(),
    };

    Json(ProfilePage {
        user: session.identity().cloned(),
        continue_watching,
    })
}

#[tracing::instrument(skip_all)]
pub(super) async fn settings(CurrentSession(session): CurrentSession) -> Json<UserResponse> {
    Json(UserResponse::new(session.identity().cloned()))
}

#[tracing::instrument(skip_all)]
pub(super) async fn login(Query(params): Query<ReturnTo>) -> Json<AuthPage> {
    Json(AuthPage {
        user: None,
        return_to: params.local_path(),
    })
}

#[tracing::instrument(skip_all)]
pub(super) async fn register(Query(params): Query<ReturnTo>) -> Json<AuthPage> {
    Json(AuthPage {
        user: None,
        return_to: params.local_path(),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::header::COOKIE;
    use serde_json::Value;

    use super::*;
    use crate::testing::{FakeOrigin, cookie_header};

    fn local_path(target: &str) -> String {
        ReturnTo {
            target: Some(target.to_owned()),
        }
        .local_path()
    }

    #[test]
    fn return_targets_stay_local() {
        assert_eq!(local_path("/profile"), "/profile");
        assert_eq!(local_path("/search?q=x"), "/search?q=x");
        assert_eq!(local_path("//evil.example"), "/");
        assert_eq!(local_path("https://evil.example"), "/");
        assert_eq!(local_path("/\\evil.example"), "/");
        assert_eq!(ReturnTo::default().local_path(), "/");
    }

    #[tokio::test]
    async fn profile_lists_continue_watching() -> anyhow::Result<()> {
        let origin = FakeOrigin::spawn().await?;
        let server = origin.gateway()?;

        let response = server
            .get("/profile")
            .add_header(COOKIE, cookie_header(Some(FakeOrigin::VALID_ACCESS), None))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["user"]["username"], "frieren");
        assert_eq!(body["continue_watching"][0]["position"], 312);
        Ok(())
    }

    #[tokio::test]
    async fn settings_returns_the_user() -> anyhow::Result<()> {
        let origin = FakeOrigin::spawn().await?;
        let server = origin.gateway()?;

        let response = server
            .get("/settings")
            .add_header(COOKIE, cookie_header(Some(FakeOrigin::VALID_ACCESS), None))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["user"]["email"], "frieren@example.com");
        Ok(())
    }

    #[tokio::test]
    async fn login_page_echoes_return_target() -> anyhow::Result<()> {
        let origin = FakeOrigin::spawn().await?;
        let server = origin.gateway()?;

        let response = server
            .get("/login")
            .add_query_param("return", "/watch/ep-7")
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert!(body["user"].is_null());
        assert_eq!(body["return_to"], "/watch/ep-7");

        let body: Value = server
            .get("/register")
            .add_query_param("return", "//evil.example")
            .await
            .json();
        assert_eq!(body["return_to"], "/");
        Ok(())
    }
}
