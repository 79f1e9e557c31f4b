//! WebSocket layer: connection handling and frame encoding.
//!
//! The endpoint at `/ws/room/{room_id}` places the connection in the room
//! and streams edits both ways.

pub mod connection;
pub mod handler;
pub mod messages;
