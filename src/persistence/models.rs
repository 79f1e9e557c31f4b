//! Database models for rooms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::RoomId;

/// A stored row from the `rooms` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    /// Room identifier (primary key).
    pub id: RoomId,
    /// Last flushed document content; `None` until the first flush.
    pub content: Option<String>,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl RoomRecord {
    /// Builds a record for a room that has never been written.
    #[must_use]
    pub fn empty(id: RoomId) -> Self {
        Self {
            id,
            content: None,
            created_at: Utc::now(),
        }
    }
}
