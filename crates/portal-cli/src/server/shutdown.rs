//! Graceful shutdown on `SIGINT` or `SIGTERM`.

use std::time::Duration;

use crate::TRACING_TARGET_SERVER_SHUTDOWN;

/// Process signal that ends the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Interrupt,
    Terminate,
}

impl Signal {
    const fn name(self) -> &'static str {
        match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
        }
    }
}

/// Waits for Ctrl+C. A handler that cannot be installed never fires.
async fn interrupt() -> Signal {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(
            target: TRACING_TARGET_SERVER_SHUTDOWN,
            error = %err,
            signal = Signal::Interrupt.name(),
            "cannot listen for signal"
        );
        std::future::pending::<()>().await;
    }

    Signal::Interrupt
}

#[cfg(unix)]
async fn terminate() -> Signal {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut stream) => {
            stream.recv().await;
        }
        Err(err) => {
            tracing::error!(
                target: TRACING_TARGET_SERVER_SHUTDOWN,
                error = %err,
                signal = Signal::Terminate.name(),
                "cannot listen for signal"
            );
            std::future::pending::<()>().await;
        }
    }

    Signal::Terminate
}

#[cfg(not(unix))]
async fn terminate() -> Signal {
    std::future::pending().await
}

/// Resolves once the process is asked to stop.
///
/// In-flight requests then get up to `shutdown_timeout` to finish.
pub async fn shutdown_signal(shutdown_timeout: Duration) {
    let signal = tokio::select! {
        signal = interrupt() => signal,
        signal = terminate() => signal,
    };

    tracing::info!(
        target: TRACING_TARGET_SERVER_SHUTDOWN,
        signal = signal.name(),
        timeout_secs = shutdown_timeout.as_secs(),
        "draining connections"
    );
}
