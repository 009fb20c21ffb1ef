//! Per-request session resolution.

use portal_origin::{AccessToken, OriginClient, RefreshToken, TokenGrant, User};

use crate::TRACING_TARGET_SESSION;
use crate::service::{Credentials, RefreshError, TokenRefresher};

/// Identity and credentials of the current request.
///
/// Computed once per request by the session layer and never persisted. The
/// credentials are the ones in force after resolution: rotated if a refresh
/// happened, empty if the session was cleared.
#[derive(Debug, Clone, Default)]
pub struct Session {
    identity: Option<User>,
    credentials: Credentials,
    rotated: bool,
}

impl Session {
    /// A session without identity that keeps whatever credentials it has.
    pub fn anonymous(credentials: Credentials) -> Self {
        Self {
            identity: None,
            credentials,
            rotated: false,
        }
    }

    /// A session whose access token the origin just accepted.
    pub fn authenticated(user: User, credentials: Credentials) -> Self {
        Self {
            identity: Some(user),
            credentials,
            rotated: false,
        }
    }

    /// A session established by a refresh during this request.
    pub fn rotated(grant: &TokenGrant) -> Self {
        Self {
            identity: Some(grant.user.clone()),
            credentials: Credentials::from_grant(grant),
            rotated: true,
        }
    }

    pub fn identity(&self) -> Option<&User> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Returns `true` if the pair was rotated while resolving this request.
    pub fn is_rotated(&self) -> bool {
        self.rotated
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        self.credentials.access_token.as_ref()
    }

    pub fn refresh_token(&self) -> Option<&RefreshToken> {
        self.credentials.refresh_token.as_ref()
    }
}

/// What the response must do with the credential cookies.
#[derive(Debug, Clone, Default)]
pub enum CredentialUpdate {
    /// Leave the browser's cookies as they are.
    #[default]
    Unchanged,
    /// Store the rotated pair.
    Rotated(TokenGrant),
    /// Delete both cookies.
    Cleared,
}

/// Outcome of resolving one request.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub session: Session,
    pub update: CredentialUpdate,
}

impl Resolution {
    fn unchanged(session: Session) -> Self {
        Self {
            session,
            update: CredentialUpdate::Unchanged,
        }
    }
}

/// Resolves request credentials into an identity.
#[derive(Debug, Clone)]
pub struct SessionResolver {
    origin: OriginClient,
    refresher: TokenRefresher,
}

impl SessionResolver {
    pub fn new(origin: OriginClient, refresher: TokenRefresher) -> Self {
        Self { origin, refresher }
    }

    /// Validates the access token, refreshing it once if the origin reports
    /// it expired.
    ///
    /// Identity is only ever set from an origin answer received during this
    /// call. Credentials are cleared when the origin rejects the access
    /// token with no refresh token to fall back on, or rejects the refresh
    /// token. Every other failure leaves them untouched.
    pub async fn resolve(&self, credentials: Credentials) -> Resolution {
        let Some(access_token) = credentials.access_token.clone() else {
            return Resolution::unchanged(Session::anonymous(credentials));
        };

        let error = match self.origin.me(&access_token).await {
            Ok(user) => {
                tracing::debug!(
                    target: TRACING_TARGET_SESSION,
                    user_id = %user.user_id,
                    "access token accepted"
                );
                return Resolution::unchanged(Session::authenticated(user, credentials));
            }
            Err(error) => error,
        };

        if !error.is_unauthorized() {
            tracing::warn!(
                target: TRACING_TARGET_SESSION,
                error = %error,
                "identity unresolved, keeping credentials"
            );
            return Resolution::unchanged(Session::anonymous(credentials));
        }

        let Some(refresh_token) = credentials.refresh_token.clone() else {
            tracing::debug!(
                target: TRACING_TARGET_SESSION,
                "access token expired without refresh token"
            );
            return Resolution {
                session: Session::anonymous(Credentials::default()),
                update: CredentialUpdate::Cleared,
            };
        };

        match self.refresher.refresh(&refresh_token).await {
            Ok(grant) => Resolution {
                session: Session::rotated(&grant),
                update: CredentialUpdate::Rotated(grant),
            },
            Err(RefreshError::Rejected { .. }) => Resolution {
                session: Session::anonymous(Credentials::default()),
                update: CredentialUpdate::Cleared,
            },
            Err(RefreshError::Unavailable { .. }) => {
                Resolution::unchanged(Session::anonymous(credentials))
            }
        }
    }
}
