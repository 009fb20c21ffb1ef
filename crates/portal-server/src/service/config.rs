use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use derive_builder::Builder;
use portal_origin::{OriginClient, OriginConfig};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::service::{CookiePolicy, TokenRefresher};
use crate::{Error, Result};

/// Default values for configuration options.
mod defaults {
    /// Origin API base URL for local development.
    pub const ORIGIN_URL: &str = "http://localhost:8080/v1";

    /// Per-call origin timeout in milliseconds.
    pub const ORIGIN_TIMEOUT_MS: u64 = 10_000;

    /// Retries after a refresh call fails in transit.
    pub const REFRESH_RETRIES: u32 = 2;

    /// Back-off step between refresh retries in milliseconds.
    pub const REFRESH_BACKOFF_MS: u64 = 250;

    /// Access cookie lifetime when the origin declares none.
    pub const ACCESS_TOKEN_TTL_SECS: u64 = 3600;

    /// Refresh cookie lifetime in days.
    pub const REFRESH_TOKEN_TTL_DAYS: u64 = 30;
}

/// App [`state`] configuration.
///
/// [`state`]: crate::service::ServiceState
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
#[cfg_attr(feature = "config", derive(Args))]
#[must_use = "config does nothing unless you use it"]
#[builder(
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate")
)]
pub struct ServiceConfig {
    /// Base URL of the origin API; every origin path is appended to it.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "ORIGIN_URL", default_value = defaults::ORIGIN_URL)
    )]
    #[builder(default = "defaults::ORIGIN_URL.to_owned()")]
    pub origin_url: String,

    /// Timeout of a single origin call in milliseconds.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "ORIGIN_TIMEOUT_MS", default_value_t = defaults::ORIGIN_TIMEOUT_MS)
    )]
    #[builder(default = "defaults::ORIGIN_TIMEOUT_MS")]
    pub origin_timeout_ms: u64,

    /// Retries of a refresh call that failed without a response.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "REFRESH_RETRIES", default_value_t = defaults::REFRESH_RETRIES)
    )]
    #[builder(default = "defaults::REFRESH_RETRIES")]
    pub refresh_retries: u32,

    /// Linear back-off step between refresh retries in milliseconds.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "REFRESH_BACKOFF_MS", default_value_t = defaults::REFRESH_BACKOFF_MS)
    )]
    #[builder(default = "defaults::REFRESH_BACKOFF_MS")]
    pub refresh_backoff_ms: u64,

    /// Marks credential cookies `Secure`. Enable everywhere but local
    /// development.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "SECURE_COOKIES", default_value = "false")
    )]
    #[builder(default)]
    pub secure_cookies: bool,

    /// Access cookie lifetime in seconds when the origin declares none.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "ACCESS_TOKEN_TTL_SECS", default_value_t = defaults::ACCESS_TOKEN_TTL_SECS)
    )]
    #[builder(default = "defaults::ACCESS_TOKEN_TTL_SECS")]
    pub access_token_ttl_secs: u64,

    /// Refresh cookie lifetime in days.
    #[cfg_attr(
        feature = "config",
        arg(long, env = "REFRESH_TOKEN_TTL_DAYS", default_value_t = defaults::REFRESH_TOKEN_TTL_DAYS)
    )]
    #[builder(default = "defaults::REFRESH_TOKEN_TTL_DAYS")]
    pub refresh_token_ttl_days: u64,
}

impl ServiceConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Returns the per-call origin timeout.
    pub fn origin_timeout(&self) -> Duration {
        Duration::from_millis(self.origin_timeout_ms)
    }

    /// Creates the origin client.
    pub fn connect_origin(&self) -> Result<OriginClient> {
        let base_url = Url::parse(&self.origin_url)
            .map_err(|e| Error::config("invalid origin url").with_source(e))?;

        let config = OriginConfig::new(base_url).with_timeout(self.origin_timeout());
        Ok(OriginClient::new(config)?)
    }

    /// Creates the refresher sharing the given origin client.
    pub fn create_refresher(&self, origin: OriginClient) -> TokenRefresher {
        TokenRefresher::with_retries(
            origin,
            self.refresh_retries,
            Duration::from_millis(self.refresh_backoff_ms),
        )
    }

    /// Returns the attributes applied to credential cookies.
    pub fn cookie_policy(&self) -> CookiePolicy {
        let seconds = |secs: u64| time::Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX));

        CookiePolicy::new(self.secure_cookies)
            .with_access_ttl(seconds(self.access_token_ttl_secs))
            .with_refresh_ttl(time::Duration::days(
                i64::try_from(self.refresh_token_ttl_days).unwrap_or(i64::MAX),
            ))
    }
}

impl ServiceConfigBuilder {
    fn validate(builder: &ServiceConfigBuilder) -> Result<(), String> {
        if let Some(origin_url) = &builder.origin_url {
            let url = Url::parse(origin_url).map_err(|e| format!("invalid origin url: {e}"))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err("origin url must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(timeout_ms) = builder.origin_timeout_ms
            && timeout_ms == 0
        {
            return Err("origin timeout must be greater than 0".to_string());
        }

        if let Some(retries) = builder.refresh_retries
            && retries > 10
        {
            return Err("refresh retries cannot exceed 10".to_string());
        }

        if let Some(ttl) = builder.access_token_ttl_secs
            && ttl == 0
        {
            return Err("access token ttl must be greater than 0".to_string());
        }

        if let Some(days) = builder.refresh_token_ttl_days
            && !(1..=365).contains(&days)
        {
            return Err("refresh token ttl must be between 1 and 365 days".to_string());
        }

        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            origin_url: defaults::ORIGIN_URL.to_owned(),
            origin_timeout_ms: defaults::ORIGIN_TIMEOUT_MS,
            refresh_retries: defaults::REFRESH_RETRIES,
            refresh_backoff_ms: defaults::REFRESH_BACKOFF_MS,
            secure_cookies: false,
            access_token_ttl_secs: defaults::ACCESS_TOKEN_TTL_SECS,
            refresh_token_ttl_days: defaults::REFRESH_TOKEN_TTL_DAYS,
        }
    }
}
