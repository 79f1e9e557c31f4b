//! Room service: catalog queries and session construction.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use super::session::PendingSession;
use crate::domain::{MemberHandle, Outbound, RoomId, RoomRegistry};
use crate::error::ServerError;
use crate::persistence::{RoomRecord, RoomStore};

/// A stored room joined with its live occupancy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomView {
    /// Room identifier.
    pub id: RoomId,
    /// Last flushed content.
    pub content: Option<String>,
    /// Row creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Members currently connected.
    pub occupancy: usize,
    /// Maximum simultaneous members.
    pub capacity: usize,
}

/// Orchestration layer shared by the REST handlers and the WebSocket
/// endpoint.
///
/// Owns handles to the [`RoomRegistry`] (live membership) and the
/// [`RoomStore`] (durable content). The registry is the single instance
/// for the whole process; every connection reaches it through here.
#[derive(Debug, Clone)]
pub struct RoomService {
    registry: Arc<RoomRegistry>,
    store: Arc<dyn RoomStore>,
    outbound_queue_capacity: usize,
}

impl RoomService {
    /// Creates a new `RoomService`.
    #[must_use]
    pub fn new(
        registry: Arc<RoomRegistry>,
        store: Arc<dyn RoomStore>,
        outbound_queue_capacity: usize,
    ) -> Self {
        Self {
            registry,
            store,
            outbound_queue_capacity: outbound_queue_capacity.max(1),
        }
    }

    /// Returns a reference to the inner [`RoomRegistry`].
    #[must_use]
    pub fn registry(&self) -> &Arc<RoomRegistry> {
        &self.registry
    }

    /// Creates a member handle for a new connection and the pending session
    /// that will try to place it in `room_id`.
    ///
    /// The returned receiver is the connection's outbound queue; the
    /// connection layer must drain it to the socket.
    #[must_use]
    pub fn open_session(&self, room_id: RoomId) -> (PendingSession, mpsc::Receiver<Outbound>) {
        let (member, outbound) = MemberHandle::channel(self.outbound_queue_capacity);
        let session = PendingSession::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.store),
            room_id,
            member,
        );
        (session, outbound)
    }

    /// Creates a new, empty room.
    ///
    /// # Errors
    ///
    /// Returns a [`ServerError`] if the store rejects the insert.
    pub async fn create_room(&self) -> Result<RoomView, ServerError> {
        let record = self.store.create().await?;
        tracing::info!(room_id = %record.id, "room created");
        Ok(self.view(record).await)
    }

    /// Lists every stored room with its live occupancy.
    ///
    /// # Errors
    ///
    /// Returns a [`ServerError`] if the store query fails.
    pub async fn list_rooms(&self) -> Result<Vec<RoomView>, ServerError> {
        let records = self.store.list().await?;
        let mut views = Vec::with_capacity(records.len());
        for record in records {
            views.push(self.view(record).await);
        }
        Ok(views)
    }

    /// Fetches one stored room with its live occupancy.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::RoomNotFound`] if the store has no such room.
    pub async fn get_room(&self, room_id: RoomId) -> Result<RoomView, ServerError> {
        let record = self
            .store
            .get(room_id)
            .await?
            .ok_or(ServerError::RoomNotFound(*room_id.as_uuid()))?;
        Ok(self.view(record).await)
    }

    async fn view(&self, record: RoomRecord) -> RoomView {
        RoomView {
            occupancy: self.registry.occupancy(record.id).await,
            capacity: self.registry.capacity(),
            id: record.id,
            content: record.content,
            created_at: record.created_at,
        }
    }
}
