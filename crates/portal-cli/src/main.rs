#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;

use anyhow::Context;
use axum::Router;
use portal_server::handler::routes;
use portal_server::middleware::{RouterObservabilityExt, RouterRecoveryExt, RouterSecurityExt};
use portal_server::service::ServiceState;

use crate::config::{Cli, MiddlewareConfig};

// Tracing target constants
pub const TRACING_TARGET_SERVER_STARTUP: &str = "portal_cli::server::startup";
pub const TRACING_TARGET_SERVER_SHUTDOWN: &str = "portal_cli::server::shutdown";
pub const TRACING_TARGET_CONFIG: &str = "portal_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    tracing::info!(
        target: TRACING_TARGET_SERVER_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        "starting portal gateway"
    );

    cli.log();
    cli.validate()?;

    let state = ServiceState::from_config(&cli.service).context("failed to create service state")?;
    let router = create_router(state, &cli.middleware);

    server::serve(router, cli.server)
        .await
        .context("server stopped")?;

    Ok(())
}

/// Creates the router with all middleware layers applied.
///
/// The last layer added is the outermost:
/// 1. Recovery catches panics and enforces the request timeout.
/// 2. Observability adds request ids and spans.
/// 3. Security adds CORS, headers and compression.
/// 4. The gateway routes carry their own session and access layers.
fn create_router(state: ServiceState, middleware: &MiddlewareConfig) -> Router {
    routes(state.clone())
        .with_state(state)
        .with_security(&middleware.cors)
        .with_observability()
        .with_recovery(&middleware.recovery)
}
