//! PostgreSQL implementation of the room store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::RoomStore;
use super::models::RoomRecord;
use crate::config::ServerConfig;
use crate::domain::RoomId;
use crate::error::ServerError;

/// PostgreSQL-backed room store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresRoomStore {
    pool: PgPool,
}

impl PostgresRoomStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized from `config`.
    ///
    /// # Errors
    ///
    /// Returns a [`ServerError::PersistenceError`] if the database is
    /// unreachable.
    pub async fn connect(config: &ServerConfig) -> Result<Self, ServerError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(config.database_connect_timeout())
            .connect(&config.database_url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies the embedded schema migrations.
    ///
    /// # Errors
    ///
    /// Returns a [`ServerError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), ServerError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ServerError::PersistenceError(e.to_string()))
    }
}

fn into_record((id, content, created_at): (Uuid, Option<String>, DateTime<Utc>)) -> RoomRecord {
    RoomRecord {
        id: RoomId::from_uuid(id),
        content,
        created_at,
    }
}

#[async_trait]
impl RoomStore for PostgresRoomStore {
    async fn load(&self, room_id: RoomId) -> Result<Option<String>, ServerError> {
        let content = sqlx::query_scalar::<_, Option<String>>(
            "SELECT content FROM rooms WHERE id = $1",
        )
        .bind(Uuid::from(room_id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(content.flatten())
    }

    async fn save(&self, room_id: RoomId, content: &str) -> Result<(), ServerError> {
        let result = sqlx::query(
            "INSERT INTO rooms (id, content) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET content = EXCLUDED.content",
        )
        .bind(Uuid::from(room_id))
        .bind(content)
        .execute(&self.pool)
        .await?;

        tracing::debug!(%room_id, rows = result.rows_affected(), "room content saved");
        Ok(())
    }

    async fn create(&self) -> Result<RoomRecord, ServerError> {
        let row = sqlx::query_as::<_, (Uuid, Option<String>, DateTime<Utc>)>(
            "INSERT INTO rooms (id) VALUES ($1) RETURNING id, content, created_at",
        )
        .bind(Uuid::new_v4())
        .fetch_one(&self.pool)
        .await?;

        Ok(into_record(row))
    }

    async fn get(&self, room_id: RoomId) -> Result<Option<RoomRecord>, ServerError> {
        let row = sqlx::query_as::<_, (Uuid, Option<String>, DateTime<Utc>)>(
            "SELECT id, content, created_at FROM rooms WHERE id = $1",
        )
        .bind(Uuid::from(room_id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(into_record))
    }

    async fn list(&self) -> Result<Vec<RoomRecord>, ServerError> {
        let rows = sqlx::query_as::<_, (Uuid, Option<String>, DateTime<Utc>)>(
            "SELECT id, content, created_at FROM rooms ORDER BY created_at ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(into_record).collect())
    }
}
