//! Session endpoints: register, login, logout, refresh and who-am-I.
//!
//! Token values only ever travel in cookies; response bodies carry the user.

use axum::Router;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use portal_origin::{LoginRequest, OriginClient, RegisterRequest};

use crate::extract::{CurrentSession, Json};
use crate::handler::{ErrorKind, LogoutResponse, OriginReply, UserResponse, origin_failure};
use crate::service::{CookiePolicy, RefreshError, ServiceState, TokenRefresher};

/// Tracing target for session endpoints.
const TRACING_TARGET: &str = "portal_server::handler::auth";

/// Creates an account and starts its session.
#[tracing::instrument(skip_all)]
async fn register(
    State(origin): State<OriginClient>,
    State(policy): State<CookiePolicy>,
    Json(request): Json<RegisterRequest>,
) -> Response {
    match origin.register(&request).await {
        Ok(grant) => {
            let cookies = policy.issue(&grant);
            (cookies, Json(UserResponse::new(Some(grant.user)))).into_response()
        }
        Err(error) => {
            tracing::debug!(
                target: TRACING_TARGET,
                error = %error,
                "registration failed"
            );
            origin_failure(error)
        }
    }
}

/// Exchanges credentials for a session.
#[tracing::instrument(skip_all)]
async fn login(
    State(origin): State<OriginClient>,
    State(policy): State<CookiePolicy>,
    Json(request): Json<LoginRequest>,
) -> Response {
    match origin.login(&request).await {
        Ok(grant) => {
            let cookies = policy.issue(&grant);
            (cookies, Json(UserResponse::new(Some(grant.user)))).into_response()
        }
        Err(error) => {
            tracing::debug!(
                target: TRACING_TARGET,
                error = %error,
                "login failed"
            );
            origin_failure(error)
        }
    }
}

/// Ends the session. The origin is told best-effort; cookies are cleared
/// regardless of its answer.
#[tracing::instrument(skip_all)]
async fn logout(
    State(origin): State<OriginClient>,
    State(policy): State<CookiePolicy>,
    CurrentSession(session): CurrentSession,
) -> Response {
    if let Some(refresh_token) = session.refresh_token()
        && let Err(error) = origin.logout(refresh_token).await
    {
        tracing::warn!(
            target: TRACING_TARGET,
            error = %error,
            "origin logout failed, clearing cookies anyway"
        );
    }

    (policy.expire(), Json(LogoutResponse { success: true })).into_response()
}

/// Rotates the token pair on the browser's request.
///
/// A pair the session layer already rotated during this request is not
/// rotated again; the layer writes it.
#[tracing::instrument(skip_all)]
async fn refresh(
    State(refresher): State<TokenRefresher>,
    State(policy): State<CookiePolicy>,
    CurrentSession(session): CurrentSession,
) -> Response {
    if session.is_rotated() {
        return Json(UserResponse::new(session.identity().cloned())).into_response();
    }

    let Some(refresh_token) = session.refresh_token() else {
        return ErrorKind::MissingAuthToken
            .with_message("No refresh token")
            .into_response();
    };

    match refresher.refresh(refresh_token).await {
        Ok(grant) => {
            let cookies = policy.issue(&grant);
            (cookies, Json(UserResponse::new(Some(grant.user)))).into_response()
        }
        Err(RefreshError::Rejected { status, body }) => {
            (policy.expire(), OriginReply::new(status, body)).into_response()
        }
        Err(RefreshError::Unavailable { reason }) => ErrorKind::ServiceUnavailable
            .with_context(reason)
            .into_response(),
    }
}

/// Returns the identity resolved for this request, or `null`.
#[tracing::instrument(skip_all)]
async fn whoami(CurrentSession(session): CurrentSession) -> Json<UserResponse> {
    Json(UserResponse::new(session.identity().cloned()))
}

/// Returns a [`Router`] with the session endpoints.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/auth/me", get(whoami))
}

#[cfg(test)]
mod test {
    use std::sync::atomic::Ordering;

    use axum::http::StatusCode;
    use axum::http::header::COOKIE;
    use axum_extra::extract::cookie::SameSite;
    use serde_json::{Value, json};

    use crate::service::ServiceConfig;
    use crate::testing::{FakeOrigin, cookie_header, gateway_with, set_cookie, set_cookies};

    #[tokio::test]
    async fn register_sets_cookies_without_tokens_in_body() -> anyhow::Result<()> {
        let origin = FakeOrigin::spawn().await?;
        let server = origin.gateway()?;

        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "email": "fern@example.com",
                "username": "fern",
                "password": FakeOrigin::PASSWORD
            }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["user"]["user_id"], FakeOrigin::USER_ID);
        assert!(body.get("access_token").is_none());
        assert!(body.get("refresh_token").is_none());
        assert!(!response.text().contains(FakeOrigin::VALID_ACCESS));

        let access = set_cookie(&response, "access_token").expect("access cookie");
        assert_eq!(access.value(), FakeOrigin::VALID_ACCESS);
        assert_eq!(access.path(), Some("/"));
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.same_site(), Some(SameSite::Lax));
        assert_eq!(access.max_age(), Some(time::Duration::seconds(900)));

        let refresh = set_cookie(&response, "refresh_token").expect("refresh cookie");
        assert_eq!(refresh.value(), FakeOrigin::VALID_REFRESH);
        assert_eq!(refresh.http_only(), Some(true));
        assert_eq!(refresh.max_age(), Some(time::Duration::days(30)));
        Ok(())
    }

    #[tokio::test]
    async fn register_conflict_is_relayed() -> anyhow::Result<()> {
        let origin = FakeOrigin::spawn().await?;
        let server = origin.gateway()?;

        let response = server
            .post("/api/auth/register")
            .json(&json!({
                "email": FakeOrigin::TAKEN_EMAIL,
                "username": "fern",
                "password": FakeOrigin::PASSWORD
            }))
            .await;

        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["error"]["message"], "Email already registered");
        assert!(set_cookies(&response).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_relayed() -> anyhow::Result<()> {
        let origin = FakeOrigin::spawn().await?;
        let server = origin.gateway()?;

        let response = server
            .post("/api/auth/login")
            .json(&json!({ "login": "frieren", "password": "nope" }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert!(set_cookies(&response).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn logout_clears_even_without_session() -> anyhow::Result<()> {
        let origin = FakeOrigin::spawn().await?;
        let server = origin.gateway()?;

        let response = server.post("/api/auth/logout").await;

        response.assert_status_ok();
        response.assert_json(&json!({ "success": true }));
        assert_eq!(set_cookies(&response).len(), 2);
        assert_eq!(origin.calls.logout.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_without_cookie_is_unauthorized() -> anyhow::Result<()> {
        let origin = FakeOrigin::spawn().await?;
        let server = origin.gateway()?;

        let response = server.post("/api/auth/refresh").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(origin.calls.refresh.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_rotates_pair() -> anyhow::Result<()> {
        let origin = FakeOrigin::spawn().await?;
        let server = origin.gateway()?;

        let response = server
            .post("/api/auth/refresh")
            .add_header(COOKIE, cookie_header(None, Some(FakeOrigin::VALID_REFRESH)))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["user"]["user_id"], FakeOrigin::USER_ID);
        assert_eq!(set_cookies(&response).len(), 2);
        assert_eq!(
            set_cookie(&response, "refresh_token").map(|c| c.value().to_owned()),
            Some(FakeOrigin::ROTATED_REFRESH.to_owned())
        );
        Ok(())
    }

    #[tokio::test]
    async fn refresh_after_layer_rotation_is_not_repeated() -> anyhow::Result<()> {
        let origin = FakeOrigin::spawn().await?;
        let server = origin.gateway()?;

        let response = server
            .post("/api/auth/refresh")
            .add_header(
                COOKIE,
                cookie_header(Some(FakeOrigin::EXPIRED_ACCESS), Some(FakeOrigin::VALID_REFRESH)),
            )
            .await;

        response.assert_status_ok();
        assert_eq!(origin.calls.refresh.load(Ordering::SeqCst), 1);
        assert_eq!(set_cookies(&response).len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn rejected_refresh_clears_and_relays() -> anyhow::Result<()> {
        let origin = FakeOrigin::spawn().await?;
        let server = origin.gateway()?;

        let response = server
            .post("/api/auth/refresh")
            .add_header(COOKIE, cookie_header(None, Some("revoked")))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["error"]["message"], "Invalid refresh token");

        let cookies = set_cookies(&response);
        assert_eq!(cookies.len(), 2);
        assert!(cookies.iter().all(|cookie| cookie.value().is_empty()));
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_refresh_keeps_cookies() -> anyhow::Result<()> {
        let config = ServiceConfig {
            origin_url: FakeOrigin::unreachable_url()?,
            refresh_retries: 0,
            ..ServiceConfig::default()
        };
        let server = gateway_with(&config)?;

        let response = server
            .post("/api/auth/refresh")
            .add_header(COOKIE, cookie_header(None, Some(FakeOrigin::VALID_REFRESH)))
            .await;

        response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
        assert!(set_cookies(&response).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn whoami_is_idempotent() -> anyhow::Result<()> {
        let origin = FakeOrigin::spawn().await?;
        let server = origin.gateway()?;
        let cookies = cookie_header(Some(FakeOrigin::VALID_ACCESS), Some(FakeOrigin::VALID_REFRESH));

        let first = server
            .get("/api/auth/me")
            .add_header(COOKIE, cookies.clone())
            .await;
        let second = server.get("/api/auth/me").add_header(COOKIE, cookies).await;

        first.assert_status_ok();
        second.assert_status_ok();
        assert_eq!(first.json::<Value>(), second.json::<Value>());
        assert_eq!(first.json::<Value>()["user"]["user_id"], FakeOrigin::USER_ID);
        assert!(set_cookies(&first).is_empty());
        assert!(set_cookies(&second).is_empty());
        assert_eq!(origin.calls.refresh.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn whoami_without_session_is_null() -> anyhow::Result<()> {
        let origin = FakeOrigin::spawn().await?;
        let server = origin.gateway()?;

        let response = server.get("/api/auth/me").await;

        response.assert_status_ok();
        response.assert_json(&json!({ "user": null }));
        Ok(())
    }
}
