//! Persistence layer: durable room content.
//!
//! The [`RoomStore`] trait is the only thing the session lifecycle knows
//! about durability. [`PostgresRoomStore`] backs it with `sqlx::PgPool`;
//! [`InMemoryRoomStore`] keeps content in process memory for tests and
//! persistence-disabled deployments.

pub mod memory;
pub mod models;
pub mod postgres;

use async_trait::async_trait;

pub use memory::InMemoryRoomStore;
pub use models::RoomRecord;
pub use postgres::PostgresRoomStore;

use crate::domain::RoomId;
use crate::error::ServerError;

/// Durable load/save of room content, plus the catalog queries used by the
/// REST endpoints.
#[async_trait]
pub trait RoomStore: Send + Sync + std::fmt::Debug {
    /// Returns the last persisted content of `room_id`, or `None` if the
    /// room has no row or its content was never written.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::PersistenceError`] on backend failure.
    async fn load(&self, room_id: RoomId) -> Result<Option<String>, ServerError>;

    /// Overwrites the content of `room_id`, creating its row if needed.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::PersistenceError`] on backend failure.
    async fn save(&self, room_id: RoomId, content: &str) -> Result<(), ServerError>;

    /// Creates a new room row with a fresh id and no content.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::PersistenceError`] on backend failure.
    async fn create(&self) -> Result<RoomRecord, ServerError>;

    /// Fetches one room row.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::PersistenceError`] on backend failure.
    async fn get(&self, room_id: RoomId) -> Result<Option<RoomRecord>, ServerError>;

    /// Lists all room rows, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::PersistenceError`] on backend failure.
    async fn list(&self) -> Result<Vec<RoomRecord>, ServerError>;
}
