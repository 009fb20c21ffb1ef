//! In-process origin service for tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::header::{AUTHORIZATION, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::Cookie;
use axum_test::{TestResponse, TestServer};
use portal_origin::{OriginClient, OriginConfig};
use serde_json::{Value, json};
use url::Url;

use crate::handler::routes;
use crate::service::{ServiceConfig, ServiceState};

/// Origin calls counted per endpoint.
#[derive(Debug, Clone, Default)]
pub(crate) struct Calls {
    pub me: Arc<AtomicUsize>,
    pub refresh: Arc<AtomicUsize>,
    pub logout: Arc<AtomicUsize>,
    pub progress: Arc<AtomicUsize>,
    pub ratings: Arc<AtomicUsize>,
    pub search: Arc<AtomicUsize>,
}

impl Calls {
    fn hit(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

/// Origin service served on an ephemeral local port.
pub(crate) struct FakeOrigin {
    addr: SocketAddr,
    pub calls: Calls,
}

impl FakeOrigin {
    pub const VALID_ACCESS: &'static str = "valid-access";
    pub const EXPIRED_ACCESS: &'static str = "expired-access";
    pub const SLOW_ACCESS: &'static str = "slow-access";
    pub const VALID_REFRESH: &'static str = "valid-refresh";
    pub const ROTATED_ACCESS: &'static str = "rotated-access";
    pub const ROTATED_REFRESH: &'static str = "rotated-refresh";
    pub const USER_ID: &'static str = "user-1";
    pub const PASSWORD: &'static str = "Pw12345!";
    pub const TAKEN_EMAIL: &'static str = "taken@example.com";
    pub const MISSING_ANIME: &'static str = "missing";

    /// How long the origin holds a refresh call before answering.
    pub const REFRESH_DELAY: Duration = Duration::from_millis(250);

    /// How long the origin holds `/me` for [`Self::SLOW_ACCESS`].
    pub const SLOW_DELAY: Duration = Duration::from_secs(2);

    pub async fn spawn() -> anyhow::Result<Self> {
        let calls = Calls::default();

        let router = Router::new()
            .route("/v1/me", get(me))
            .route("/v1/auth/register", post(register))
            .route("/v1/auth/login", post(login))
            .route("/v1/auth/refresh", post(refresh))
            .route("/v1/auth/logout", post(logout))
            .route("/v1/activity/progress", post(progress))
            .route("/v1/activity/continue", get(continue_watching))
            .route(
                "/v1/ratings/{anime_id}",
                get(ratings).post(rate).delete(unrate),
            )
            .route("/v1/search", get(search))
            .route("/v1/anime/{anime_id}", get(anime))
            .route("/v1/anime/{anime_id}/episodes", get(episodes))
            .route("/v1/watch/{episode_id}", get(watch))
            .with_state(calls.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        Ok(Self { addr, calls })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub fn client(&self) -> anyhow::Result<OriginClient> {
        self.client_with_timeout(Duration::from_secs(5))
    }

    pub fn client_with_timeout(&self, timeout: Duration) -> anyhow::Result<OriginClient> {
        let config = OriginConfig::new(Url::parse(&self.base_url())?).with_timeout(timeout);
        Ok(OriginClient::new(config)?)
    }

    /// Base URL on a port nothing listens on.
    pub fn unreachable_url() -> anyhow::Result<String> {
        let addr = std::net::TcpListener::bind("127.0.0.1:0")?.local_addr()?;
        Ok(format!("http://{addr}/v1"))
    }

    /// Client pointing at [`Self::unreachable_url`].
    pub fn unreachable_client() -> anyhow::Result<OriginClient> {
        let base_url = Url::parse(&Self::unreachable_url()?)?;
        let config = OriginConfig::new(base_url).with_timeout(Duration::from_secs(1));
        Ok(OriginClient::new(config)?)
    }

    /// Gateway configuration pointing at this origin.
    pub fn config(&self) -> ServiceConfig {
        ServiceConfig {
            origin_url: self.base_url(),
            origin_timeout_ms: 500,
            refresh_retries: 0,
            refresh_backoff_ms: 0,
            ..ServiceConfig::default()
        }
    }

    /// Full gateway router in front of this origin.
    pub fn gateway(&self) -> anyhow::Result<TestServer> {
        gateway_with(&self.config())
    }
}

/// Full gateway router built from `config`.
pub(crate) fn gateway_with(config: &ServiceConfig) -> anyhow::Result<TestServer> {
    let state = ServiceState::from_config(config)?;
    let app = routes(state.clone()).with_state(state);
    Ok(TestServer::new(app)?)
}

/// `Cookie` request header carrying the given credentials.
pub(crate) fn cookie_header(access: Option<&str>, refresh: Option<&str>) -> HeaderValue {
    let pairs: Vec<String> = [("access_token", access), ("refresh_token", refresh)]
        .into_iter()
        .filter_map(|(name, value)| value.map(|value| format!("{name}={value}")))
        .collect();

    HeaderValue::from_str(&pairs.join("; ")).expect("cookie header is ascii")
}

/// Parses every `Set-Cookie` header of a response.
pub(crate) fn set_cookies(response: &TestResponse) -> Vec<Cookie<'static>> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| Cookie::parse(value.to_owned()).ok())
        .collect()
}

/// Returns the `Set-Cookie` entry named `name`.
pub(crate) fn set_cookie(response: &TestResponse, name: &str) -> Option<Cookie<'static>> {
    set_cookies(response)
        .into_iter()
        .find(|cookie| cookie.name() == name)
}

fn user() -> Value {
    json!({
        "user_id": FakeOrigin::USER_ID,
        "email": "frieren@example.com",
        "username": "frieren"
    })
}

fn grant(access: &str, refresh: &str) -> Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "expires_in": 900,
        "user": user()
    })
}

fn failure(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": { "message": message } })))
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

fn is_valid(headers: &HeaderMap) -> bool {
    matches!(
        bearer(headers),
        Some(FakeOrigin::VALID_ACCESS | FakeOrigin::ROTATED_ACCESS)
    )
}

async fn me(State(calls): State<Calls>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    Calls::hit(&calls.me);

    if bearer(&headers) == Some(FakeOrigin::SLOW_ACCESS) {
        tokio::time::sleep(FakeOrigin::SLOW_DELAY).await;
        return (StatusCode::OK, Json(user()));
    }

    if is_valid(&headers) {
        (StatusCode::OK, Json(user()))
    } else {
        failure(StatusCode::UNAUTHORIZED, "Token expired")
    }
}

async fn register(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["email"] == FakeOrigin::TAKEN_EMAIL {
        return failure(StatusCode::CONFLICT, "Email already registered");
    }

    (
        StatusCode::CREATED,
        Json(grant(FakeOrigin::VALID_ACCESS, FakeOrigin::VALID_REFRESH)),
    )
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["password"] == FakeOrigin::PASSWORD {
        (
            StatusCode::OK,
            Json(grant(FakeOrigin::VALID_ACCESS, FakeOrigin::VALID_REFRESH)),
        )
    } else {
        failure(StatusCode::UNAUTHORIZED, "Invalid credentials")
    }
}

async fn refresh(State(calls): State<Calls>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    Calls::hit(&calls.refresh);
    tokio::time::sleep(FakeOrigin::REFRESH_DELAY).await;

    if body["refresh_token"] == FakeOrigin::VALID_REFRESH {
        (
            StatusCode::OK,
            Json(grant(FakeOrigin::ROTATED_ACCESS, FakeOrigin::ROTATED_REFRESH)),
        )
    } else {
        failure(StatusCode::UNAUTHORIZED, "Invalid refresh token")
    }
}

async fn logout(State(calls): State<Calls>) -> StatusCode {
    Calls::hit(&calls.logout);
    StatusCode::NO_CONTENT
}

async fn progress(
    State(calls): State<Calls>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    Calls::hit(&calls.progress);

    if !is_valid(&headers) {
        return failure(StatusCode::UNAUTHORIZED, "Token expired");
    }

    (
        StatusCode::OK,
        Json(json!({ "saved": true, "episode_id": body["episode_id"] })),
    )
}

async fn continue_watching(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !is_valid(&headers) {
        return failure(StatusCode::UNAUTHORIZED, "Token expired");
    }

    (
        StatusCode::OK,
        Json(json!({ "items": [{ "episode_id": "ep-7", "position": 312 }] })),
    )
}

async fn ratings(Path(anime_id): Path<String>, headers: HeaderMap) -> Json<Value> {
    let user_rating = if is_valid(&headers) { json!(9) } else { Value::Null };

    Json(json!({
        "anime_id": anime_id,
        "average": 8.7,
        "count": 1204,
        "user_rating": user_rating
    }))
}

async fn rate(
    State(calls): State<Calls>,
    Path(anime_id): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    Calls::hit(&calls.ratings);

    (
        StatusCode::CREATED,
        Json(json!({ "anime_id": anime_id, "rating": body["rating"] })),
    )
}

async fn unrate(State(calls): State<Calls>) -> StatusCode {
    Calls::hit(&calls.ratings);
    StatusCode::NO_CONTENT
}

async fn search(
    State(calls): State<Calls>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    Calls::hit(&calls.search);

    Json(json!({
        "hits": [{ "anime_id": "frieren", "title": "Sousou no Frieren" }],
        "total": 1,
        "params": params
    }))
}

async fn anime(Path(anime_id): Path<String>) -> (StatusCode, Json<Value>) {
    if anime_id == FakeOrigin::MISSING_ANIME {
        return failure(StatusCode::NOT_FOUND, "Anime not found");
    }

    (
        StatusCode::OK,
        Json(json!({ "id": anime_id, "title": "Sousou no Frieren" })),
    )
}

async fn episodes(Path(anime_id): Path<String>) -> Json<Value> {
    Json(json!({
        "anime_id": anime_id,
        "episodes": [{ "id": "ep-1", "number": 1 }, { "id": "ep-2", "number": 2 }]
    }))
}

async fn watch(
    Path(episode_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    Json(json!({
        "episode_id": episode_id,
        "category": params.get("category"),
        "sources": []
    }))
}
