//! Axum WebSocket upgrade handler.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::response::IntoResponse;

use super::connection::run_connection;
use crate::app_state::AppState;
use crate::domain::RoomId;

/// `GET /ws/room/{room_id}`: Upgrade to a WebSocket and join the room.
///
/// The upgrade always completes; a full room is reported afterwards with a
/// close frame so the client receives a well-formed reason.
pub async fn room_ws_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<RoomId>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let (session, outbound) = state.room_service.open_session(room_id);
    ws.on_upgrade(move |socket| run_connection(socket, session, outbound))
}
