//! Middleware configuration for the HTTP server.
//!
//! ```bash
//! portal-cli --allowed-origins "https://example.com" --request-timeout 60
//! ```

use anyhow::{Result as AnyhowResult, anyhow};
use clap::Args;
use portal_server::middleware::{CorsConfig, RecoveryConfig};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET_CONFIG;

/// CORS and recovery settings of the browser-facing router.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Origins allowed to call the gateway with credentials.
    #[clap(flatten)]
    pub cors: CorsConfig,

    /// Request timeout and panic recovery.
    #[clap(flatten)]
    pub recovery: RecoveryConfig,
}

impl MiddlewareConfig {
    /// Validates CORS origins and the request timeout.
    pub fn validate(&self) -> AnyhowResult<()> {
        self.cors.validate()?;

        let timeout = self.recovery.request_timeout;
        if timeout == 0 || timeout > 300 {
            return Err(anyhow!(
                "Request timeout {timeout} seconds is invalid. Must be between 1 and 300 seconds."
            ));
        }

        Ok(())
    }

    /// Logs middleware configuration at info level.
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            origins = ?self.cors.allowed_origins,
            credentials = self.cors.allow_credentials,
            "CORS configuration"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            request_timeout_secs = self.recovery.request_timeout,
            "Recovery configuration"
        );
    }
}
