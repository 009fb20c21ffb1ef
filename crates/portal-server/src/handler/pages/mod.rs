//! Page-data loaders.
//!
//! Each route returns the JSON a renderer needs for one page, always
//! including the resolved `user`. Origin failures degrade to empty sections
//! and never to an error page.

mod account;
mod anime;
mod home;
mod search;
mod watch;

use axum::Router;
use axum::routing::get;
use portal_origin::{OriginClient, OriginRequest, OriginResponse};
use serde_json::Value;

use crate::TRACING_TARGET_HANDLER;
use crate::service::ServiceState;

/// Fetches one page section. A failure is logged and yields `None`.
async fn load_section(origin: &OriginClient, request: OriginRequest) -> Option<Value> {
    let path = request.path().to_owned();
    let result = origin
        .forward(request)
        .await
        .and_then(OriginResponse::into_result);

    match result {
        Ok(response) => response.body,
        Err(error) => {
            tracing::warn!(
                target: TRACING_TARGET_HANDLER,
                path = %path,
                error = %error,
                "page section unavailable"
            );
            None
        }
    }
}

/// Takes the array stored under `key`, or nothing.
fn take_items(body: Option<Value>, key: &str) -> Vec<Value> {
    match body.and_then(|mut body| body.get_mut(key).map(Value::take)) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// Returns a [`Router`] with every page route.
pub fn routes() -> Router<ServiceState> {
    Router::new()
        .route("/", get(home::home))
        .route("/search", get(search::search))
        .route("/anime/{anime_id}", get(anime::anime))
        .route("/watch/{episode_id}", get(watch::watch))
        .route("/profile", get(account::profile))
        .route("/settings", get(account::settings))
        .route("/login", get(account::login))
        .route("/register", get(account::register))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn take_items_tolerates_odd_bodies() {
        assert!(take_items(None, "hits").is_empty());
        assert!(take_items(Some(json!({ "hits": "nope" })), "hits").is_empty());
        assert!(take_items(Some(json!([1, 2])), "hits").is_empty());
        assert_eq!(take_items(Some(json!({ "hits": [1, 2] })), "hits").len(), 2);
    }
}
