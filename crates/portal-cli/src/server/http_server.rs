//! Plain HTTP listener with graceful shutdown.

use std::future::IntoFuture;
use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use super::lifecycle::serve_with_shutdown;
use super::{ServerError, ServerResult, shutdown_signal};
use crate::{TRACING_TARGET_SERVER_SHUTDOWN, TRACING_TARGET_SERVER_STARTUP};
use crate::config::ServerConfig;

/// Binds the configured address and serves `app` until a shutdown signal.
///
/// Connections still open `shutdown_timeout` after the signal are dropped.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server stops
/// with an I/O error.
pub async fn serve(app: Router, server_config: ServerConfig) -> ServerResult<()> {
    let server_addr = server_config.server_addr();

    let listener = match TcpListener::bind(server_addr).await {
        Ok(listener) => {
            tracing::info!(
                target: TRACING_TARGET_SERVER_STARTUP,
                addr = %server_addr,
                "Successfully bound to address"
            );

            listener
        }
        Err(listener_err) => {
            tracing::error!(
                target: TRACING_TARGET_SERVER_STARTUP,
                addr = %server_addr,
                error = %listener_err,
                "Failed to bind to address"
            );

            return Err(ServerError::bind_error(
                &server_addr.to_string(),
                listener_err,
            ));
        }
    };

    let shutdown_timeout = server_config.shutdown_timeout();
    let (draining_tx, draining_rx) = oneshot::channel();
    let signal = async move {
        shutdown_signal(shutdown_timeout).await;
        let _ = draining_tx.send(());
    };

    serve_with_shutdown(&server_config, || async move {
        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .into_future();

        let deadline = async move {
            if draining_rx.await.is_ok() {
                tokio::time::sleep(shutdown_timeout).await;
            } else {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            result = server => result,
            () = deadline => {
                tracing::warn!(
                    target: TRACING_TARGET_SERVER_SHUTDOWN,
                    timeout_secs = shutdown_timeout.as_secs(),
                    "shutdown timeout elapsed, dropping open connections"
                );
                Ok(())
            }
        }
    })
    .await
}
