//! Room DTOs for create, get, and list operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::RoomId;
use crate::service::RoomView;

/// Room as returned by `POST /rooms` and `GET /rooms/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RoomResponse {
    /// Room identifier; use it in `/ws/room/{id}`.
    pub id: RoomId,
    /// Last flushed document content, `null` until first written.
    pub content: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Members currently connected.
    pub occupancy: usize,
    /// Maximum simultaneous members.
    pub capacity: usize,
}

impl From<RoomView> for RoomResponse {
    fn from(view: RoomView) -> Self {
        Self {
            id: view.id,
            content: view.content,
            created_at: view.created_at,
            occupancy: view.occupancy,
            capacity: view.capacity,
        }
    }
}

/// Paginated response for `GET /rooms`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoomListResponse {
    /// Rooms on this page.
    pub data: Vec<RoomResponse>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}
