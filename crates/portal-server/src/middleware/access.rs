//! Route-level access control.

use axum::extract::Request;
use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use url::form_urlencoded;

use crate::TRACING_TARGET_GATE;
use crate::service::Session;

/// Who may see a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteAccess {
    /// Anyone.
    Public,
    /// Signed-out visitors only.
    AuthOnly,
    /// Signed-in visitors only.
    Protected,
}

/// Path prefixes in match order; the first match wins.
const ROUTE_TABLE: &[(&str, RouteAccess)] = &[
    ("/login", RouteAccess::AuthOnly),
    ("/register", RouteAccess::AuthOnly),
    ("/watch", RouteAccess::Protected),
    ("/profile", RouteAccess::Protected),
    ("/settings", RouteAccess::Protected),
];

impl RouteAccess {
    /// Classifies a request path by plain prefix match.
    pub fn classify(path: &str) -> Self {
        ROUTE_TABLE
            .iter()
            .find(|(prefix, _)| path.starts_with(prefix))
            .map_or(Self::Public, |(_, access)| *access)
    }

    /// Returns the string representation for logging.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::AuthOnly => "auth_only",
            Self::Protected => "protected",
        }
    }
}

/// What the gate does with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    RedirectTo(String),
}

/// Decides whether a visitor may see `path`.
pub fn decide(path: &str, authenticated: bool) -> AccessDecision {
    match (RouteAccess::classify(path), authenticated) {
        (RouteAccess::AuthOnly, true) => AccessDecision::RedirectTo("/".to_owned()),
        (RouteAccess::Protected, false) => AccessDecision::RedirectTo(login_redirect(path)),
        _ => AccessDecision::Allow,
    }
}

/// `/login?return=<path>` with the path percent-encoded.
pub fn login_redirect(path: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("/login?return={encoded}")
}

/// Applies [`decide`] to every request using the resolved session.
///
/// Must run inside [`resolve_session`](crate::middleware::resolve_session).
pub async fn enforce_access(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let authenticated = request
        .extensions()
        .get::<Session>()
        .is_some_and(Session::is_authenticated);

    match decide(&path, authenticated) {
        AccessDecision::Allow => next.run(request).await,
        AccessDecision::RedirectTo(location) => {
            tracing::debug!(
                target: TRACING_TARGET_GATE,
                path = %path,
                access = RouteAccess::classify(&path).as_str(),
                location = %location,
                "redirecting"
            );
            (StatusCode::FOUND, [(LOCATION, location)]).into_response()
        }
    }
}
