//! Request tracing and logging.

use std::time::Instant;

use axum::Router;
use axum::extract::Request;
use axum::http::header;
use axum::middleware::{Next, from_fn};
use axum::response::Response;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::RouteAccess;

/// Tracing target for per-request logs.
const TRACING_TARGET_REQUEST: &str = "portal_server::request";

/// Extension trait for `axum::`[`Router`] to apply observability middleware.
pub trait RouterObservabilityExt<S> {
    /// Layers request ids, tracing spans and request logging.
    ///
    /// `Authorization` and `Cookie` are marked sensitive so that credential
    /// values never reach the logs.
    fn with_observability(self) -> Self;
}

impl<S> RouterObservabilityExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_observability(self) -> Self {
        self.layer(from_fn(log_requests))
            .layer(PropagateRequestIdLayer::new(
                header::HeaderName::from_static("x-request-id"),
            ))
            .layer(SetSensitiveRequestHeadersLayer::new([
                header::AUTHORIZATION,
                header::COOKIE,
            ]))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(
                header::HeaderName::from_static("x-request-id"),
                MakeRequestUuid,
            ))
    }
}

/// Logs every request with its access class, status and duration.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let access = RouteAccess::classify(&path);

    let response = next.run(request).await;
    let duration = start_time.elapsed();

    tracing::debug!(
        target: TRACING_TARGET_REQUEST,
        method = %method,
        path = %path,
        access = access.as_str(),
        status = response.status().as_u16(),
        elapsed_ms = duration.as_millis() as u64,
        "request completed"
    );

    response
}
