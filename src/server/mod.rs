mod handlers;
mod routes;

pub use routes::create_router;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::EngineSettings;
use crate::db::Database;
use crate::engine::BookingEngine;

/// Shared application state
pub struct AppState {
    pub engine: BookingEngine,
}

impl AppState {
    pub fn new(engine: BookingEngine) -> Self {
        Self { engine }
    }
}

/// Run the API server
pub async fn run_server(addr: SocketAddr, db_path: &str, settings: EngineSettings) -> Result<()> {
    let db = Database::open(db_path, settings.store_timeout())
        .with_context(|| format!("Failed to open database {}", db_path))?;

    let state = Arc::new(AppState::new(BookingEngine::new(db, settings)));
    let app = create_router(state);

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
