use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use derive_more::{Deref, From};
use portal_origin::AccessToken;

use crate::handler::{Error, ErrorKind};
use crate::service::Session;

/// The session resolved for this request.
///
/// Falls back to an anonymous, credential-less session on routes mounted
/// outside the session layer.
#[must_use]
#[derive(Debug, Clone, Default, Deref, From)]
pub struct CurrentSession(pub Session);

impl CurrentSession {
    #[inline]
    pub fn into_inner(self) -> Session {
        self.0
    }
}

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        let session = parts.extensions.get::<Session>().cloned();
        Ok(Self(session.unwrap_or_default()))
    }
}

/// The access token currently in force, rotated if the session layer
/// refreshed it.
///
/// Rejects with `401 Not authenticated` when the request carries none, before
/// any origin call is made.
#[must_use]
#[derive(Debug, Clone, Deref)]
pub struct AccessCredential(pub AccessToken);

impl<S> FromRequestParts<S> for AccessCredential
where
    S: Send + Sync,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .and_then(Session::access_token)
            .cloned()
            .map(Self)
            .ok_or_else(|| ErrorKind::MissingAuthToken.into_error())
    }
}
