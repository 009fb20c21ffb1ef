use axum::extract::State;
use portal_origin::{OriginClient, OriginRequest};

use super::{load_section, take_items};
use crate::extract::{CurrentSession, Json};
use crate::handler::response::HomePage;

/// Titles per landing-page shelf.
const SHELF_SIZE: u32 = 12;

/// Continue-watching entries on the landing page.
const CONTINUE_LIMIT: u32 = 10;

fn shelf(key: &str, value: &str) -> OriginRequest {
    OriginRequest::get("/search")
        .with_query("limit", SHELF_SIZE)
        .with_query(key, value)
}

/// Loads the landing page shelves in parallel.
#[tracing::instrument(skip_all)]
pub(super) async fn home(
    State(origin): State<OriginClient>,
    CurrentSession(session): CurrentSession,
) -> Json<HomePage> {
    let continue_watching = async {
        let token = session.identity().and(session.access_token());
        match token {
            Some(token) => {
                let request = OriginRequest::get("/activity/continue")
                    .with_query("limit", CONTINUE_LIMIT)
                    .with_bearer(token);
                take_items(load_section(&origin, request).await, "items")
            }
            None => Vec::new(),
        }
    };

    let (trending, top_rated, airing, continue_watching) = tokio::join!(
        load_section(&origin, shelf("sort", "popularity")),
        load_section(&origin, shelf("sort", "score")),
        load_section(&origin, shelf("status", "airing")),
        continue_watching,
    );

    Json(HomePage {
        user: session.identity().cloned(),
        trending: take_items(trending, "hits"),
        top_rated: take_items(top_rated, "hits"),
        airing: take_items(airing, "hits"),
        continue_watching,
    })
}
