use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;

use crate::TRACING_TARGET_SESSION;
use crate::service::{CookiePolicy, CredentialUpdate, CredentialsWritten, Resolution, SessionResolver};

/// Resolves the session of every request before anything else sees it.
///
/// The resolved [`Session`] is stored in the request extensions. Once the
/// inner service has answered, a rotated pair is written and a rejected pair
/// is cleared, unless the response already carries credential cookies.
///
/// [`Session`]: crate::service::Session
pub async fn resolve_session(
    State(resolver): State<SessionResolver>,
    State(policy): State<CookiePolicy>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let credentials = policy.read(&jar);
    let Resolution { session, update } = resolver.resolve(credentials).await;

    tracing::trace!(
        target: TRACING_TARGET_SESSION,
        path = %request.uri().path(),
        authenticated = session.is_authenticated(),
        rotated = session.is_rotated(),
        "session resolved"
    );

    request.extensions_mut().insert(session);
    let mut response = next.run(request).await;

    if response.extensions().get::<CredentialsWritten>().is_some() {
        return response;
    }

    match update {
        CredentialUpdate::Unchanged => {}
        CredentialUpdate::Rotated(grant) => {
            policy.issue(&grant).append_to(response.headers_mut());
        }
        CredentialUpdate::Cleared => {
            tracing::debug!(
                target: TRACING_TARGET_SESSION,
                "clearing rejected credentials"
            );
            policy.expire().append_to(response.headers_mut());
        }
    }

    response
}
