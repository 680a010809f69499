//! HTTP query surface
//!
//! - `GET /` service status and uptime
//! - `GET /vehiclestore/status` history size and last sync message
//! - `GET /lookup?hash=` | `?country=&regnr=` | `?country=&vin=`
//! - `PATCH /vehicle` with `{"hash": "...", "op": "enable" | "disable"}`

pub mod handlers;
pub mod response;

use axum::{
    routing::{get, patch},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::middleware;
use crate::store::VehicleStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<VehicleStore>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<VehicleStore>) -> Self {
        Self {
            store,
            started_at: Instant::now(),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/vehiclestore/status", get(handlers::store_status))
        .route("/lookup", get(handlers::lookup))
        .route("/vehicle", patch(handlers::patch_vehicle))
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
}

/// Serve until Ctrl+C or SIGTERM
pub async fn serve(config: &ServerConfig, state: AppState) -> anyhow::Result<()> {
    let addr: SocketAddr = config.bind_address().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal(config.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
