mod catalog;
mod config;
mod errors;
mod models;
mod routes;
mod state;
mod store;
mod timetable;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::DomainStore;
use crate::timetable::engine::SolverConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting timetable scheduler API v{}", env!("CARGO_PKG_VERSION"));

    let solver = SolverConfig {
        max_backtracks: config.solver_max_backtracks,
        timeout: Duration::from_millis(config.solver_timeout_ms),
    };
    info!(
        max_backtracks = solver.max_backtracks,
        timeout_ms = config.solver_timeout_ms,
        "Solver limits configured"
    );

    let state = AppState {
        store: Arc::new(DomainStore::new()),
        solver,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
