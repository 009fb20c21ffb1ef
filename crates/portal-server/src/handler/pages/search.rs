use axum::extract::State;
use portal_origin::{OriginClient, OriginRequest};
use serde::Deserialize;
use serde_json::Value;

use super::{load_section, take_items};
use crate::extract::{CurrentSession, Json, Query};
use crate::handler::response::{SearchFilters, SearchPage};

/// Results per search page.
const PAGE_SIZE: u32 = 24;

/// Search page query string. Missing values are empty.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct SearchParams {
    q: String,
    genres: String,
    status: String,
    #[serde(rename = "type")]
    kind: String,
    sort: Option<String>,
    page: Option<u32>,
}

/// Loads one page of search results.
#[tracing::instrument(skip_all)]
pub(super) async fn search(
    State(origin): State<OriginClient>,
    CurrentSession(session): CurrentSession,
    Query(params): Query<SearchParams>,
) -> Json<SearchPage> {
    let page = params.page.unwrap_or(1).max(1);
    let offset = u64::from(page - 1) * u64::from(PAGE_SIZE);

    let mut request = OriginRequest::get("/search");
    for (key, value) in [
        ("q", &params.q),
        ("genres", &params.genres),
        ("status", &params.status),
        ("type", &params.kind),
    ] {
        if !value.is_empty() {
            request = request.with_query(key, value);
        }
    }
    let request = request
        .with_query("limit", PAGE_SIZE)
        .with_query("offset", offset);

    let body = load_section(&origin, request).await;
    let total = body
        .as_ref()
        .and_then(|body| body.get("total"))
        .and_then(Value::as_u64);
    let results = take_items(body, "hits");
    let total = total.unwrap_or(results.len() as u64);

    Json(SearchPage {
        user: session.identity().cloned(),
        results,
        total,
        query: params.q,
        filters: SearchFilters {
            genres: params.genres,
            status: params.status,
            kind: params.kind,
            sort: params.sort.unwrap_or_else(|| "score".to_owned()),
        },
        page,
    })
}
