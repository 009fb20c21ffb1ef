//! CLI configuration.
//!
//! ```text
//! Cli
//! ├── server: ServerConfig          # Host, port, shutdown
//! ├── middleware: MiddlewareConfig  # CORS, request timeout
//! └── service: ServiceConfig        # Origin, refresh, cookies
//! ```
//!
//! Every option can be given as a flag or an environment variable.
//!
//! ```bash
//! portal-cli --origin-url "https://api.example.com/v1" --port 8080
//! ORIGIN_URL="https://api.example.com/v1" PORT=8080 portal-cli
//! ```

mod middleware;
mod server;

use std::process;

use anyhow::Context;
use clap::Parser;
pub use middleware::MiddlewareConfig;
use portal_server::service::ServiceConfig;
use serde::{Deserialize, Serialize};
pub use server::ServerConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_SERVER_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser, Serialize, Deserialize)]
#[command(name = "portal")]
#[command(about = "Session gateway between browsers and the origin API")]
#[command(version)]
pub struct Cli {
    /// Server network and lifecycle configuration.
    #[clap(flatten)]
    pub server: ServerConfig,

    /// HTTP middleware configuration (CORS, timeouts).
    #[clap(flatten)]
    pub middleware: MiddlewareConfig,

    /// Origin connection, token refresh and cookie configuration.
    #[clap(flatten)]
    pub service: ServiceConfig,
}

impl Cli {
    /// Loads a `.env` file (if enabled) and parses CLI arguments.
    ///
    /// The file is read first so clap picks its values up as environment
    /// defaults.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with `RUST_LOG` filtering, `info` by default.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.server
            .validate()
            .context("invalid server configuration")?;
        self.middleware
            .validate()
            .context("invalid middleware configuration")?;
        Ok(())
    }

    /// Logs configuration. Nothing logged here is sensitive.
    pub fn log(&self) {
        Self::log_build_info();
        self.server.log();
        self.middleware.log();

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            origin_url = %self.service.origin_url,
            origin_timeout_ms = self.service.origin_timeout_ms,
            refresh_retries = self.service.refresh_retries,
            secure_cookies = self.service.secure_cookies,
            access_token_ttl_secs = self.service.access_token_ttl_secs,
            refresh_token_ttl_days = self.service.refresh_token_ttl_days,
            "Service configuration"
        );
    }

    fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_SERVER_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
