//! pairpad server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use pairpad::app::build_app;
use pairpad::app_state::AppState;
use pairpad::config::ServerConfig;
use pairpad::domain::RoomRegistry;
use pairpad::persistence::{InMemoryRoomStore, PostgresRoomStore, RoomStore};
use pairpad::service::RoomService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = ServerConfig::from_env().context("loading configuration")?;
    tracing::info!(addr = %config.listen_addr, capacity = config.room_capacity, "starting pairpad");

    // Build persistence layer
    let store: Arc<dyn RoomStore> = if config.persistence_enabled {
        let postgres = PostgresRoomStore::connect(&config)
            .await
            .context("connecting to database")?;
        postgres.migrate().await.context("running migrations")?;
        Arc::new(postgres)
    } else {
        tracing::warn!("persistence disabled, room content is kept in memory only");
        Arc::new(InMemoryRoomStore::new())
    };

    // Build domain and service layers
    let registry = Arc::new(RoomRegistry::new(config.room_capacity));
    let room_service = Arc::new(RoomService::new(
        registry,
        store,
        config.outbound_queue_capacity,
    ));

    let app = build_app(AppState { room_service });

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
