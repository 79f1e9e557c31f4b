//! Service layer: business logic orchestration.
//!
//! [`RoomService`] serves the REST catalog and hands out
//! [`PendingSession`]s, which drive one connection through the room
//! session lifecycle.

pub mod room_service;
pub mod session;

pub use room_service::{RoomService, RoomView};
pub use session::{ActiveSession, Admission, PendingSession, SessionOutcome};
