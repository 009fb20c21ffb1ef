//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! [`routes`] returns every browser-facing route wrapped in the session and
//! access layers. The ambient layers from [`middleware`] are applied on top
//! by the binary.
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler
//! [`middleware`]: crate::middleware

mod activity;
mod auth;
mod error;
mod pages;
mod ratings;
mod response;

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::{IntoResponse, Response};

pub use crate::handler::error::{Error, ErrorKind, Result};
pub(crate) use crate::handler::error::origin_failure;
pub use crate::handler::response::{ErrorResponse, LogoutResponse, OriginReply, UserResponse};
use crate::middleware::{enforce_access, resolve_session};
use crate::service::ServiceState;

#[inline]
async fn handler() -> Response {
    ErrorKind::NotFound.into_response()
}

/// Returns a validated origin path segment, rejecting anything that could
/// escape the intended origin route.
pub(crate) fn resource_id(id: &str) -> Result<&str> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(id)
    } else {
        Err(ErrorKind::BadRequest.with_message("Invalid resource identifier"))
    }
}

/// Returns a [`Router`] with all routes.
///
/// Every request, including unmatched ones, is resolved into a session first
/// and then passed through the access gate.
pub fn routes(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .merge(auth::routes())
        .merge(activity::routes())
        .merge(ratings::routes())
        .merge(pages::routes())
        .fallback(handler)
        .layer(from_fn(enforce_access))
        .layer(from_fn_with_state(state, resolve_session))
}
