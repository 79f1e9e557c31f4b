//! Concurrent room membership with per-room fan-out.
//!
//! [`RoomRegistry`] maps each active [`RoomId`] to a [`RoomEntry`] behind
//! its own [`tokio::sync::Mutex`]. The outer map sits behind a
//! [`tokio::sync::RwLock`]:
//!
//! - `join` and `leave` take the outer write lock, so capacity checks and
//!   entry creation/removal are atomic.
//! - `broadcast`, `broadcast_notice` and `is_full` take the outer read lock
//!   plus the entry lock, so they never observe a half-applied membership
//!   change while broadcasts to different rooms run in parallel.
//!
//! Each entry also remembers the last edit broadcast in it, which is the
//! room's current document while it has members.
//!
//! A member admitted with `join_held` gets nothing queued until `release`
//! puts its initial state at the front of its queue, ahead of whatever the
//! room sent in between.
//!
//! Fan-out only enqueues onto each member's bounded outbound queue; no lock
//! is ever held across a socket write.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use super::member::{DeliveryError, MemberHandle, MemberId, Outbound};
use super::{RoomEntry, RoomId, RoomNotice};

/// Central table of active rooms and their members.
///
/// # Concurrency
///
/// - Joins and leaves are serialized registry-wide.
/// - Broadcasts to the same room are serialized, which fixes the order in
///   which every member observes that room's events.
/// - Broadcasts to different rooms are concurrent.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, Arc<Mutex<RoomEntry>>>>,
    capacity: usize,
}

impl RoomRegistry {
    /// Creates an empty registry whose rooms admit at most `capacity`
    /// members each.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            capacity,
        }
    }

    /// Maximum simultaneous members per room.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Admits `member` to `room_id`, creating the room if it has no entry.
    ///
    /// Returns `false` without touching membership when the room is full.
    pub async fn join(&self, room_id: RoomId, member: MemberHandle) -> bool {
        self.admit(room_id, member, false).await
    }

    /// Like [`Self::join`], but nothing is queued for the new member until
    /// [`Self::release`]; room traffic meanwhile is held in order.
    pub async fn join_held(&self, room_id: RoomId, member: MemberHandle) -> bool {
        self.admit(room_id, member, true).await
    }

    /// Queues `initial` for a member admitted with [`Self::join_held`],
    /// followed by everything held back for it, and resumes direct
    /// delivery.
    ///
    /// Returns the number of messages queued.
    pub async fn release(
        &self,
        room_id: RoomId,
        member_id: MemberId,
        initial: Option<String>,
    ) -> usize {
        let map = self.rooms.read().await;
        let Some(entry_lock) = map.get(&room_id) else {
            return 0;
        };
        let mut entry = entry_lock.lock().await;
        let backlog = entry.release(member_id);
        let Some(member) = entry.member(member_id) else {
            return 0;
        };

        let mut queued = 0;
        for message in initial.map(Outbound::Edit).into_iter().chain(backlog) {
            match member.try_deliver(message) {
                Ok(()) => queued += 1,
                Err(e) => log_refused(room_id, member_id, e),
            }
        }
        queued
    }

    async fn admit(&self, room_id: RoomId, member: MemberHandle, held: bool) -> bool {
        let member_id = member.id();
        let mut map = self.rooms.write().await;

        if let Some(entry_lock) = map.get(&room_id) {
            let mut entry = entry_lock.lock().await;
            let admitted = if held {
                entry.admit_held(member)
            } else {
                entry.admit(member)
            };
            if admitted {
                tracing::debug!(%room_id, %member_id, occupancy = entry.len(), "member admitted");
            }
            return admitted;
        }

        if self.capacity == 0 {
            return false;
        }

        let mut entry = RoomEntry::new(self.capacity);
        if held {
            entry.admit_held(member);
        } else {
            entry.admit(member);
        }
        map.insert(room_id, Arc::new(Mutex::new(entry)));
        tracing::debug!(%room_id, %member_id, "room opened");
        true
    }

    /// Removes `member_id` from `room_id`, dropping the room entry once it
    /// is empty.
    ///
    /// Idempotent: returns `false` if the member (or room) was not present.
    pub async fn leave(&self, room_id: RoomId, member_id: MemberId) -> bool {
        let mut map = self.rooms.write().await;
        let Some(entry_lock) = map.get(&room_id) else {
            return false;
        };

        let mut entry = entry_lock.lock().await;
        let removed = entry.remove(member_id);
        let now_empty = entry.is_empty();
        drop(entry);

        if now_empty {
            map.remove(&room_id);
            tracing::debug!(%room_id, "room closed");
        }
        removed
    }

    /// Records `payload` as the room's newest content and sends it to every
    /// member of `room_id` except `exclude`.
    ///
    /// Returns the number of members the payload was queued for.
    pub async fn broadcast(&self, room_id: RoomId, payload: &str, exclude: MemberId) -> usize {
        self.fan_out(room_id, &Outbound::Edit(payload.to_string()), exclude)
            .await
    }

    /// Sends a membership notice to every member of `room_id` except
    /// `exclude`.
    ///
    /// Returns the number of members the notice was queued for.
    pub async fn broadcast_notice(
        &self,
        room_id: RoomId,
        notice: RoomNotice,
        exclude: MemberId,
    ) -> usize {
        self.fan_out(room_id, &Outbound::Notice(notice), exclude)
            .await
    }

    /// Returns `true` if `room_id` has no free slot. Rooms without an entry
    /// are never full.
    pub async fn is_full(&self, room_id: RoomId) -> bool {
        let map = self.rooms.read().await;
        match map.get(&room_id) {
            Some(entry_lock) => entry_lock.lock().await.is_full(),
            None => false,
        }
    }

    /// Current number of members in `room_id`.
    pub async fn occupancy(&self, room_id: RoomId) -> usize {
        let map = self.rooms.read().await;
        match map.get(&room_id) {
            Some(entry_lock) => entry_lock.lock().await.len(),
            None => 0,
        }
    }

    /// Returns `true` if `member_id` is currently in `room_id`.
    pub async fn contains(&self, room_id: RoomId, member_id: MemberId) -> bool {
        let map = self.rooms.read().await;
        match map.get(&room_id) {
            Some(entry_lock) => entry_lock.lock().await.contains(member_id),
            None => false,
        }
    }

    /// Last edit broadcast in `room_id` while it has been active.
    pub async fn latest_edit(&self, room_id: RoomId) -> Option<String> {
        let map = self.rooms.read().await;
        let entry_lock = map.get(&room_id)?;
        let entry = entry_lock.lock().await;
        entry.latest_edit().map(str::to_string)
    }

    /// Number of rooms with at least one member.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Queues `message` for each member except `exclude`.
    ///
    /// A failed enqueue is logged and skipped; the recipient stays in the
    /// room until its own session leaves.
    async fn fan_out(&self, room_id: RoomId, message: &Outbound, exclude: MemberId) -> usize {
        let map = self.rooms.read().await;
        let Some(entry_lock) = map.get(&room_id) else {
            return 0;
        };
        let mut entry = entry_lock.lock().await;
        if let Outbound::Edit(payload) = message {
            entry.record_edit(payload);
        }

        let (delivered, failed) = entry.deliver(message, exclude);
        for (member_id, e) in failed {
            log_refused(room_id, member_id, e);
        }
        delivered
    }
}

fn log_refused(room_id: RoomId, member_id: MemberId, error: DeliveryError) {
    match error {
        DeliveryError::QueueFull => {
            tracing::warn!(%room_id, %member_id, "outbound queue full, message dropped");
        }
        DeliveryError::Disconnected => {
            tracing::debug!(%room_id, %member_id, "recipient already disconnected");
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_ROOM_CAPACITY)
    }
}
