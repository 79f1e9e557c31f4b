//! In-process room store.
//!
//! Content survives only as long as the process. Used when
//! `PERSISTENCE_ENABLED=false` and throughout the test suite.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::RoomStore;
use super::models::RoomRecord;
use crate::domain::RoomId;
use crate::error::ServerError;

/// `HashMap`-backed [`RoomStore`].
#[derive(Debug, Default)]
pub struct InMemoryRoomStore {
    rooms: RwLock<HashMap<RoomId, RoomRecord>>,
}

impl InMemoryRoomStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomStore for InMemoryRoomStore {
    async fn load(&self, room_id: RoomId) -> Result<Option<String>, ServerError> {
        let rooms = self.rooms.read().await;
        Ok(rooms.get(&room_id).and_then(|r| r.content.clone()))
    }

    async fn save(&self, room_id: RoomId, content: &str) -> Result<(), ServerError> {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room_id)
            .or_insert_with(|| RoomRecord::empty(room_id))
            .content = Some(content.to_string());
        Ok(())
    }

    async fn create(&self) -> Result<RoomRecord, ServerError> {
        let record = RoomRecord::empty(RoomId::new());
        self.rooms.write().await.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, room_id: RoomId) -> Result<Option<RoomRecord>, ServerError> {
        Ok(self.rooms.read().await.get(&room_id).cloned())
    }

    async fn list(&self) -> Result<Vec<RoomRecord>, ServerError> {
        let rooms = self.rooms.read().await;
        let mut records: Vec<RoomRecord> = rooms.values().cloned().collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }
}
