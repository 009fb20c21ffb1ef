//! Reqwest-based HTTP client for the origin service.

use std::sync::Arc;
use std::time::Instant;

use reqwest::Client;

use super::OriginConfig;
use crate::{Error, OriginRequest, OriginResponse, Result};

/// Tracing target for origin client operations.
pub const TRACING_TARGET: &str = "portal_origin::client";

/// Inner client that holds the HTTP client and configuration.
struct OriginClientInner {
    http: Client,
    config: OriginConfig,
}

/// HTTP client for the origin service.
///
/// Cheap to clone; clones share one connection pool.
///
/// # Examples
///
/// ```rust,ignore
/// use portal_origin::{AccessToken, OriginClient, OriginConfig};
///
/// let client = OriginClient::new(OriginConfig::default())?;
/// let user = client.me(&AccessToken::new(token)).await?;
/// ```
#[derive(Clone)]
pub struct OriginClient {
    inner: Arc<OriginClientInner>,
}

impl std::fmt::Debug for OriginClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OriginClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl OriginClient {
    /// Creates a new origin client with the given configuration.
    pub fn new(config: OriginConfig) -> Result<Self> {
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            base_url = %config.base_url,
            timeout_ms = timeout.as_millis(),
            "creating origin client"
        );

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()
            .map_err(|err| Error::Config(err.to_string()))?;

        let inner = OriginClientInner { http, config };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the client configuration.
    pub fn config(&self) -> &OriginConfig {
        &self.inner.config
    }

    /// Sends a request and returns whatever the origin answered.
    ///
    /// Non-2xx responses are returned as values, not errors. The only error
    /// is a call that produced no response at all.
    pub async fn forward(&self, request: OriginRequest) -> Result<OriginResponse> {
        let url = self
            .inner
            .config
            .endpoint(request.path())
            .map_err(|err| Error::Config(err.to_string()))?;

        let mut builder = self.inner.http.request(request.method().clone(), url);
        if !request.query().is_empty() {
            builder = builder.query(request.query());
        }
        if let Some(token) = request.bearer() {
            builder = builder.bearer_auth(token.as_str());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let started = Instant::now();
        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    method = %request.method(),
                    path = request.path(),
                    timeout = err.is_timeout(),
                    error = %err,
                    "origin unreachable"
                );
                return Err(Error::Unreachable(err));
            }
        };

        let status = response.status();
        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(&bytes).ok()
        };

        tracing::debug!(
            target: TRACING_TARGET,
            method = %request.method(),
            path = request.path(),
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis(),
            "origin responded"
        );

        Ok(OriginResponse::new(status, body))
    }
}
