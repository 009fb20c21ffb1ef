//! Refresh-token exchange with at most one origin call in flight per
//! session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::http::StatusCode;
use futures::future::{BoxFuture, FutureExt, Shared};
use portal_origin::{OriginClient, RefreshToken, TokenGrant};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::TRACING_TARGET_SESSION;

/// Default number of retries after a transport failure.
pub const DEFAULT_REFRESH_RETRIES: u32 = 2;

/// Default back-off step between retries; attempt `n` waits `n` steps.
pub const DEFAULT_REFRESH_BACKOFF: Duration = Duration::from_millis(250);

/// Why a refresh did not produce a new pair.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RefreshError {
    /// The origin answered with a non-2xx status. The session is over.
    #[error("refresh token rejected with status {status}")]
    Rejected {
        status: StatusCode,
        body: Option<Value>,
    },

    /// No usable answer was received. The session is kept.
    #[error("refresh unavailable: {reason}")]
    Unavailable { reason: String },
}

impl RefreshError {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

type RefreshResult = Result<TokenGrant, RefreshError>;
type InFlight = Shared<BoxFuture<'static, RefreshResult>>;

struct TokenRefresherInner {
    origin: OriginClient,
    retries: u32,
    backoff: Duration,
    in_flight: Mutex<HashMap<String, InFlight>>,
}

/// Exchanges refresh tokens for rotated pairs.
///
/// Callers presenting the same refresh token while an exchange is running
/// wait on that exchange instead of starting another one. An entry lives
/// only for the duration of its origin round-trip, which runs on its own
/// task and completes even when every caller has gone away.
#[derive(Clone)]
pub struct TokenRefresher {
    inner: Arc<TokenRefresherInner>,
}

impl std::fmt::Debug for TokenRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRefresher")
            .field("retries", &self.inner.retries)
            .field("backoff", &self.inner.backoff)
            .finish_non_exhaustive()
    }
}

impl TokenRefresher {
    /// Creates a refresher with the default retry policy.
    pub fn new(origin: OriginClient) -> Self {
        Self::with_retries(origin, DEFAULT_REFRESH_RETRIES, DEFAULT_REFRESH_BACKOFF)
    }

    /// Creates a refresher retrying transport failures `retries` times.
    pub fn with_retries(origin: OriginClient, retries: u32, backoff: Duration) -> Self {
        let inner = TokenRefresherInner {
            origin,
            retries,
            backoff,
            in_flight: Mutex::new(HashMap::new()),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Exchanges `token` for a new pair, joining an exchange already in
    /// flight for the same token.
    pub async fn refresh(&self, token: &RefreshToken) -> RefreshResult {
        let key = session_key(token);

        let exchange = {
            let mut in_flight = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            match in_flight.get(&key) {
                Some(exchange) => {
                    tracing::debug!(
                        target: TRACING_TARGET_SESSION,
                        session = %short(&key),
                        "joining refresh in flight"
                    );
                    exchange.clone()
                }
                None => {
                    let exchange = self.clone().start_exchange(key.clone(), token.clone());
                    in_flight.insert(key, exchange.clone());
                    exchange
                }
            }
        };

        exchange.await
    }

    /// Returns the number of exchanges currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Spawns the exchange for `key`. Must be called with the in-flight map
    /// locked, so the task cannot remove its entry before it is inserted.
    fn start_exchange(self, key: String, token: RefreshToken) -> InFlight {
        let task = tokio::spawn(async move {
            let result = self.exchange(&key, &token).await;

            self.inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&key);

            result
        });

        task.map(|joined| {
            joined.unwrap_or_else(|error| {
                Err(RefreshError::Unavailable {
                    reason: error.to_string(),
                })
            })
        })
        .boxed()
        .shared()
    }

    async fn exchange(&self, key: &str, token: &RefreshToken) -> RefreshResult {
        let mut attempt = 0;

        loop {
            let error = match self.inner.origin.refresh(token).await {
                Ok(grant) => {
                    tracing::info!(
                        target: TRACING_TARGET_SESSION,
                        session = %short(key),
                        user_id = %grant.user.user_id,
                        attempt,
                        "session refreshed"
                    );
                    return Ok(grant);
                }
                Err(portal_origin::Error::Rejected { status, body }) => {
                    tracing::info!(
                        target: TRACING_TARGET_SESSION,
                        session = %short(key),
                        status = status.as_u16(),
                        "refresh token rejected"
                    );
                    return Err(RefreshError::Rejected { status, body });
                }
                Err(error) => error,
            };

            if error.is_unreachable() && attempt < self.inner.retries {
                attempt += 1;
                tracing::warn!(
                    target: TRACING_TARGET_SESSION,
                    session = %short(key),
                    attempt,
                    error = %error,
                    "refresh failed in transit, retrying"
                );
                tokio::time::sleep(self.inner.backoff * attempt).await;
                continue;
            }

            tracing::warn!(
                target: TRACING_TARGET_SESSION,
                session = %short(key),
                attempt,
                error = %error,
                "refresh unavailable"
            );
            return Err(RefreshError::Unavailable {
                reason: error.to_string(),
            });
        }
    }
}

/// Hex SHA-256 of the refresh token; the map never holds raw tokens.
fn session_key(token: &RefreshToken) -> String {
    hex::encode(Sha256::digest(token.as_str().as_bytes()))
}

/// Prefix of a session key safe to log.
fn short(key: &str) -> &str {
    &key[..key.len().min(12)]
}
