//! Structured membership notices broadcast alongside edit payloads.
//!
//! Notices serialize to a single-key JSON object (`{"joined": ...}` or
//! `{"left": ...}`) so clients can tell them apart from raw edit text.

use serde::{Deserialize, Serialize};

/// Message carried by the notice sent when a member is admitted.
pub const JOINED_MESSAGE: &str = "new user joined";

/// Message carried by the notice sent after a member leaves.
pub const LEFT_MESSAGE: &str = "User left the room";

/// Membership change announced to the other occupants of a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomNotice {
    /// A new member was admitted to the room.
    Joined(String),
    /// A member left the room.
    Left(String),
}

impl RoomNotice {
    /// Notice announcing a newly admitted member.
    #[must_use]
    pub fn joined() -> Self {
        Self::Joined(JOINED_MESSAGE.to_string())
    }

    /// Notice announcing a departed member.
    #[must_use]
    pub fn left() -> Self {
        Self::Left(LEFT_MESSAGE.to_string())
    }

    /// Serializes the notice into its JSON wire form.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
