//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::RoomService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Room service for the catalog and for room sessions.
    pub room_service: Arc<RoomService>,
}
