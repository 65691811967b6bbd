//! HTTP server startup and graceful shutdown.

use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::errors::Error;

use super::routes::{build_router, ApiState};

pub async fn start_server(config: &AppConfig, state: ApiState) -> crate::Result<()> {
    let router = build_router(state);

    let listener = TcpListener::bind(&config.server.listener)
        .await
        .map_err(|e| Error::config(format!("failed to bind {}: {}", config.server.listener, e)))?;

    info!(address = %config.server.listener, "starting credgate server");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::internal(format!("server error: {}", e)))?;

    info!("credgate server shutdown completed");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM; axum then stops accepting and lets
/// in-flight requests complete.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install SIGINT handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => warn!(error = %e, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
