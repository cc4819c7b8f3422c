//! songlib-api library - song catalog HTTP service
//!
//! Exposes the router and startup routine so integration tests can drive the
//! service without a real listener or database server.

use anyhow::{Context, Result};
use axum::Router;
use songlib_common::config::ServiceConfig;
use songlib_common::db::{self, SongStore};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod api;
pub mod cli;
pub mod enrichment;
pub mod error;
pub mod pagination;

pub use crate::enrichment::EnrichmentClient;
pub use crate::error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Song table access over the shared connection pool
    pub store: SongStore,
    /// Client for the external metadata lookup
    pub enrichment: EnrichmentClient,
}

impl AppState {
    pub fn new(store: SongStore, enrichment: EnrichmentClient) -> Self {
        Self { store, enrichment }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/songs", get(api::list_songs).post(api::create_song))
        .route(
            "/songs/:id",
            get(api::get_song)
                .put(api::update_song)
                .delete(api::delete_song),
        )
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Connect, migrate and build the shared state
///
/// Any failure here is fatal for the process; nothing is served until the
/// database is reachable and its schema is current.
pub async fn init_state(config: &ServiceConfig) -> Result<AppState> {
    let dialect = config.database.dialect()?;

    let pool = db::connect(&config.database)
        .await
        .with_context(|| format!("Failed to connect to database {}", config.database.describe()))?;

    db::run_migrations(&pool, dialect)
        .await
        .context("Failed to apply database migrations")?;

    let enrichment = EnrichmentClient::new(&config.enrichment)
        .context("Failed to build enrichment client")?;
    info!("Enrichment service: {}", config.enrichment.base_url);

    Ok(AppState::new(SongStore::new(pool), enrichment))
}

/// Startup sequence: state, bind, serve until shutdown signal
pub async fn run(config: ServiceConfig) -> Result<()> {
    let state = init_state(&config).await?;

    let listener = TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;

    serve(listener, state).await
}

/// Serve on an already bound listener until Ctrl-C / SIGTERM
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr()?;
    info!("songlib-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("songlib-api stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    info!("Shutdown signal received");
}
