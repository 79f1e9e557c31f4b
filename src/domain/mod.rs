//! Domain layer: room identity, membership, notices, and the registry.
//!
//! This module contains the in-memory model of active rooms: the
//! [`RoomRegistry`] owning every membership mutation, the [`MemberHandle`]
//! used to address a connection during fan-out, and the [`RoomNotice`]
//! events announcing joins and departures.

pub mod member;
pub mod room_entry;
pub mod room_id;
pub mod room_notice;
pub mod room_registry;

pub use member::{MemberHandle, MemberId, Outbound};
pub use room_entry::RoomEntry;
pub use room_id::RoomId;
pub use room_notice::RoomNotice;
pub use room_registry::RoomRegistry;
