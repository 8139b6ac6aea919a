//! Herdbook API Server implementation
//!
//! HTTP REST API server using Axum. The register sits behind a mutex so
//! requests are applied one at a time, each ending in a full commit.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::register::Register;
use crate::store::DynStore;

use super::handlers;

/// API Server configuration
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub version: String,
    pub register: Mutex<Register<DynStore>>,
}

impl AppState {
    pub fn new(register: Register<DynStore>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            register: Mutex::new(register),
        }
    }
}

/// Build the router without binding a socket
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        .route(
            "/api/v1/records",
            get(handlers::list_records).post(handlers::add_record),
        )
        .route(
            "/api/v1/records/:index",
            axum::routing::put(handlers::update_record).delete(handlers::delete_record),
        )
        .route("/api/v1/years", get(handlers::years))
        .route("/api/v1/counts", get(handlers::counts))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the API server until SIGINT/SIGTERM
pub async fn run_api_server(config: ApiConfig, register: Register<DynStore>) -> anyhow::Result<()> {
    let state = Arc::new(AppState::new(register));
    let app = router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Herdbook API Server starting on http://{}", addr);
    info!("   Endpoints: /api/v1/records, /api/v1/years, /api/v1/counts");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Herdbook API Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("failed to install signal handler: {}", e);
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

    info!("Shutdown signal received, stopping server...");
}
