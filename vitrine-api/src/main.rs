//! Vitrine API Server Entry Point
//!
//! Loads configuration from the environment (and `.env`), opens the record
//! store and starts the Axum HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use vitrine_api::telemetry::{init_tracing, TelemetryConfig};
use vitrine_api::{
    create_app, ApiConfig, ApiError, ApiResult, AppState, AuthConfig, Db, DbConfig, NotifyConfig,
    PgStore, StoreKind,
};

#[tokio::main]
async fn main() -> ApiResult<()> {
    // A missing .env file is normal outside local development.
    let _ = dotenvy::dotenv();

    let telemetry_config = TelemetryConfig::default();
    init_tracing(&telemetry_config)?;

    let api_config = ApiConfig::from_env();
    let auth_config = AuthConfig::from_env();
    let notify_config = NotifyConfig::from_env();

    let db = match api_config.store {
        StoreKind::Postgres => {
            let db_config = DbConfig::from_env();
            tracing::info!(host = %db_config.host, dbname = %db_config.dbname, "Using Postgres store");
            Db::new(Arc::new(PgStore::from_config(&db_config)?))
        }
        StoreKind::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Db::memory()
        }
    };

    let state = AppState::new(db, api_config, auth_config, notify_config)?;
    let app = create_app(state)?;

    let addr = resolve_bind_addr()?;
    tracing::info!(%addr, "Starting Vitrine API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

fn resolve_bind_addr() -> ApiResult<SocketAddr> {
    let host = std::env::var("VITRINE_API_BIND").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port_str = std::env::var("PORT")
        .ok()
        .or_else(|| std::env::var("VITRINE_API_PORT").ok())
        .unwrap_or_else(|| "3000".to_string());
    let port = port_str
        .parse::<u16>()
        .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", port_str)))?;

    let addr = format!("{}:{}", host, port);
    addr.parse::<SocketAddr>()
        .map_err(|e| ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e)))
}
