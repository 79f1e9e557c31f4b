//! Room catalog handlers: create, list, get.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{PaginationParams, RoomListResponse, RoomResponse};
use crate::app_state::AppState;
use crate::domain::RoomId;
use crate::error::{ErrorResponse, ServerError};

/// `POST /rooms`: Create a new room.
///
/// # Errors
///
/// Returns [`ServerError`] if the store rejects the insert.
#[utoipa::path(
    post,
    path = "/api/v1/rooms",
    tag = "Rooms",
    summary = "Create a room",
    description = "Creates an empty room and returns its identifier. Rooms can also be joined without being created first; they are then stored on first flush.",
    responses(
        (status = 201, description = "Room created", body = RoomResponse),
        (status = 500, description = "Persistence failure", body = ErrorResponse),
    )
)]
pub async fn create_room(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ServerError> {
    let view = state.room_service.create_room().await?;
    Ok((StatusCode::CREATED, Json(RoomResponse::from(view))))
}

/// `GET /rooms`: List rooms with pagination.
///
/// # Errors
///
/// Returns [`ServerError`] if the store query fails.
#[utoipa::path(
    get,
    path = "/api/v1/rooms",
    tag = "Rooms",
    summary = "List rooms",
    description = "Returns a paginated list of stored rooms with their live occupancy.",
    params(PaginationParams),
    responses(
        (status = 200, description = "Paginated room list", body = RoomListResponse),
        (status = 500, description = "Persistence failure", body = ErrorResponse),
    )
)]
pub async fn list_rooms(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<impl IntoResponse, ServerError> {
    let params = params.clamped();
    let rooms = state.room_service.list_rooms().await?;
    let pagination = params.meta(rooms.len());

    let data: Vec<RoomResponse> = rooms
        .into_iter()
        .skip(params.offset())
        .take(params.per_page as usize)
        .map(RoomResponse::from)
        .collect();

    Ok(Json(RoomListResponse { data, pagination }))
}

/// `GET /rooms/{id}`: Get one room.
///
/// # Errors
///
/// Returns [`ServerError::RoomNotFound`] if the room was never stored.
#[utoipa::path(
    get,
    path = "/api/v1/rooms/{id}",
    tag = "Rooms",
    summary = "Get a room",
    params(("id" = String, Path, description = "Room identifier (UUID)")),
    responses(
        (status = 200, description = "Room details", body = RoomResponse),
        (status = 404, description = "Room not found", body = ErrorResponse),
    )
)]
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> Result<impl IntoResponse, ServerError> {
    let view = state.room_service.get_room(room_id).await?;
    Ok(Json(RoomResponse::from(view)))
}

/// Room routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/rooms/{id}", get(get_room))
}
