//! CORS, response security headers and body limits.

use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::http::header::{self, HeaderValue};
#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::{Error, Result};

/// Largest request body accepted, in bytes.
const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;

/// Origins allowed when none are configured.
const DEVELOPMENT_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:5173",
    "http://127.0.0.1:3000",
    "http://127.0.0.1:5173",
];

/// Extension trait for `axum::`[`Router`] to apply security middleware.
pub trait RouterSecurityExt<S> {
    /// Layers CORS, security headers, compression and a body limit.
    fn with_security(self, cors: &CorsConfig) -> Self;

    /// Layers security middleware with development CORS settings.
    fn with_default_security(self) -> Self;
}

impl<S> RouterSecurityExt<S> for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_security(self, cors: &CorsConfig) -> Self {
        let cors_layer = CorsLayer::new()
            .allow_origin(cors.to_header_values())
            .allow_methods([Method::GET, Method::POST, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .allow_credentials(cors.allow_credentials)
            .max_age(cors.max_age());

        self.layer(DefaultBodyLimit::max(DEFAULT_MAX_BODY_SIZE))
            .layer(CompressionLayer::new())
            .layer(cors_layer)
            .layer(SetResponseHeaderLayer::overriding(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::REFERRER_POLICY,
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            ))
    }

    fn with_default_security(self) -> Self {
        self.with_security(&CorsConfig::default())
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
pub struct CorsConfig {
    /// List of allowed CORS origins.
    ///
    /// If empty, defaults to localhost origins for development.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CORS_ORIGINS", value_delimiter = ',')
    )]
    pub allowed_origins: Vec<String>,

    /// Maximum age for CORS preflight requests in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CORS_MAX_AGE", default_value = "3600")
    )]
    pub max_age_seconds: u64,

    /// Whether browsers may send credential cookies cross-origin.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "CORS_ALLOW_CREDENTIALS", default_value = "true")
    )]
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: Vec::new(),
            max_age_seconds: 3600,
            allow_credentials: true,
        }
    }
}

impl CorsConfig {
    /// Returns the CORS max age as a Duration.
    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_seconds)
    }

    /// Rejects the `*` origin, which browsers never honor together with
    /// credentials and which the CORS layer refuses in an origin list.
    pub fn validate(&self) -> Result<()> {
        if self.allowed_origins.iter().any(|origin| origin.trim() == "*") {
            return Err(Error::config(
                "wildcard CORS origin is not allowed, list each origin explicitly",
            ));
        }

        Ok(())
    }

    /// Converts configured origins to header values, skipping `*` and
    /// invalid ones and falling back to localhost for development.
    pub fn to_header_values(&self) -> Vec<HeaderValue> {
        let origins: Vec<&str> = if self.allowed_origins.is_empty() {
            DEVELOPMENT_ORIGINS.to_vec()
        } else {
            self.allowed_origins.iter().map(String::as_str).collect()
        };

        origins
            .into_iter()
            .filter(|origin| origin.trim() != "*")
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_origin_is_rejected() {
        let cors = CorsConfig {
            allowed_origins: vec!["https://example.com".to_owned(), "*".to_owned()],
            ..CorsConfig::default()
        };

        let error = cors.validate().unwrap_err();
        assert_eq!(error.kind(), crate::ErrorKind::Config);
        assert_eq!(cors.to_header_values().len(), 1);
    }

    #[tokio::test]
    async fn wildcard_origin_does_not_break_the_router() -> anyhow::Result<()> {
        let cors = CorsConfig {
            allowed_origins: vec!["*".to_owned()],
            ..CorsConfig::default()
        };
        let router = Router::new()
            .route("/", axum::routing::get(|| async { "ok" }))
            .with_security(&cors);
        let server = axum_test::TestServer::new(router)?;

        server.get("/").await.assert_status_ok();
        Ok(())
    }

    #[test]
    fn explicit_origins_are_valid() {
        let cors = CorsConfig {
            allowed_origins: vec!["https://example.com".to_owned()],
            ..CorsConfig::default()
        };
        assert!(cors.validate().is_ok());
        assert!(CorsConfig::default().validate().is_ok());
    }

    #[test]
    fn localhost_origins_by_default() {
        let origins = CorsConfig::default().to_header_values();
        assert_eq!(origins.len(), DEVELOPMENT_ORIGINS.len());
    }

    #[test]
    fn invalid_origins_are_skipped() {
        let config = CorsConfig {
            allowed_origins: vec!["https://portal.example".into(), "bad\norigin".into()],
            ..CorsConfig::default()
        };
        assert_eq!(config.to_header_values().len(), 1);
    }
}
