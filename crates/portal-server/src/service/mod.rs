//! Application state and dependency injection.

mod config;
mod cookies;
mod refresher;
mod session;

use portal_origin::OriginClient;

pub use crate::service::config::{ServiceConfig, ServiceConfigBuilder};
pub use crate::service::cookies::{
    ACCESS_TOKEN_COOKIE, CookiePolicy, CredentialCookies, Credentials, CredentialsWritten,
    REFRESH_TOKEN_COOKIE,
};
pub use crate::service::refresher::{RefreshError, TokenRefresher};
pub use crate::service::session::{CredentialUpdate, Resolution, Session, SessionResolver};
// Re-export error types from crate root for convenience
pub use crate::{Error, Result};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct ServiceState {
    origin: OriginClient,
    refresher: TokenRefresher,
    resolver: SessionResolver,
    cookie_policy: CookiePolicy,
}

impl ServiceState {
    /// Initializes application state from configuration.
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let origin = config.connect_origin()?;
        let refresher = config.create_refresher(origin.clone());
        let resolver = SessionResolver::new(origin.clone(), refresher.clone());

        tracing::info!(
            target: crate::TRACING_TARGET_SESSION,
            origin_url = %config.origin_url,
            origin_timeout_ms = config.origin_timeout_ms,
            refresh_retries = config.refresh_retries,
            secure_cookies = config.secure_cookies,
            "service state initialized"
        );

        Ok(Self {
            origin,
            refresher,
            resolver,
            cookie_policy: config.cookie_policy(),
        })
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(origin: OriginClient);
impl_di!(refresher: TokenRefresher);
impl_di!(resolver: SessionResolver);
impl_di!(cookie_policy: CookiePolicy);
