//! Server bootstrap: bind, serve, and shut down gracefully.

use std::future::Future;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::{self, Instant};
use tracing::{error, info, warn};

use chathub_core::config::AppConfig;
use chathub_core::error::AppError;

use crate::router::build_router;
use crate::state::AppState;

/// Binds the configured address and serves until Ctrl+C or SIGTERM.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    info!("ChatHub server listening on {}", addr);

    serve(listener, AppState::new(config), shutdown_signal()).await
}

/// Serves on an already bound listener until `shutdown` resolves, then
/// closes every connection and waits for them to drain.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<(), AppError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let realtime = state.realtime.clone();
    let grace = Duration::from_secs(state.config.server.shutdown_grace_seconds);
    let app = build_router(state);

    let engine = realtime.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("Shutdown signal received, starting graceful shutdown...");
            engine.shutdown();
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    let deadline = Instant::now() + grace;
    while realtime.connections.connection_count() > 0 {
        if Instant::now() >= deadline {
            warn!(
                remaining = realtime.connections.connection_count(),
                "Connections still open after shutdown grace period"
            );
            break;
        }
        time::sleep(Duration::from_millis(50)).await;
    }

    info!("ChatHub server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
