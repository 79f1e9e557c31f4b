//! Type-safe room identifier.
//!
//! [`RoomId`] is a newtype wrapper around [`uuid::Uuid`] so that room
//! identifiers cannot be confused with member or other UUIDs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Unique identifier for a collaborative room.
///
/// Supplied externally: either by the REST create endpoint or directly by
/// the client in the WebSocket path. The [`super::RoomRegistry`] never
/// generates one; it only uses it as the key of its entry table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct RoomId(uuid::Uuid);

impl RoomId {
    /// Creates a new random `RoomId` (UUID v4).
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Creates a `RoomId` from an existing [`uuid::Uuid`].
    #[must_use]
    pub const fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner [`uuid::Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }
}

impl Default for RoomId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RoomId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl From<uuid::Uuid> for RoomId {
    fn from(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }
}

impl From<RoomId> for uuid::Uuid {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_unique_ids() {
        assert_ne!(RoomId::new(), RoomId::new());
    }

    #[test]
    fn display_matches_inner_uuid() {
        let uuid = uuid::Uuid::new_v4();
        let id = RoomId::from_uuid(uuid);
        assert_eq!(id.to_string(), uuid.to_string());
    }

    #[test]
    fn parses_from_path_segment() {
        let Ok(id) = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse::<RoomId>() else {
            panic!("valid uuid should parse");
        };
        assert_eq!(id.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
    }

    #[test]
    fn rejects_malformed_path_segment() {
        assert!("not-a-room".parse::<RoomId>().is_err());
    }

    #[test]
    fn serializes_as_bare_string() {
        let id = RoomId::new();
        let Ok(json) = serde_json::to_string(&id) else {
            panic!("serialization failed");
        };
        assert_eq!(json, format!("\"{id}\""));
    }
}
