//! Room entry: the ordered member list of one active room.

use std::collections::HashMap;

use super::member::{DeliveryError, Outbound};
use super::{MemberHandle, MemberId};

/// Occupants of one active room, bounded by a fixed capacity.
///
/// Entries only exist while they have at least one member; the
/// [`super::RoomRegistry`] drops an entry as soon as its last member
/// leaves.
#[derive(Debug)]
pub struct RoomEntry {
    /// Members in admission order.
    members: Vec<MemberHandle>,

    /// Maximum simultaneous members (immutable after creation).
    capacity: usize,

    /// Last edit accepted for fan-out in this room, if any.
    latest_edit: Option<String>,

    /// Messages held back for members whose initial state is not queued yet.
    held: HashMap<MemberId, Vec<Outbound>>,
}

impl RoomEntry {
    /// Creates an empty entry that admits at most `capacity` members.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            members: Vec::with_capacity(capacity),
            capacity,
            latest_edit: None,
            held: HashMap::new(),
        }
    }

    /// Returns `true` once the entry holds `capacity` members.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    /// Returns `true` if no member is left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Number of current members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if `member_id` is a current member.
    #[must_use]
    pub fn contains(&self, member_id: MemberId) -> bool {
        self.members.iter().any(|m| m.id() == member_id)
    }

    /// Members in admission order.
    #[must_use]
    pub fn members(&self) -> &[MemberHandle] {
        &self.members
    }

    /// Appends `member` if there is a free slot. Returns `false` when full.
    pub fn admit(&mut self, member: MemberHandle) -> bool {
        if self.is_full() {
            return false;
        }
        if !self.contains(member.id()) {
            self.members.push(member);
        }
        true
    }

    /// Like [`Self::admit`], but messages for the new member are held back
    /// until [`Self::release`].
    pub fn admit_held(&mut self, member: MemberHandle) -> bool {
        let member_id = member.id();
        let fresh = !self.contains(member_id);
        if !self.admit(member) {
            return false;
        }
        if fresh {
            self.held.insert(member_id, Vec::new());
        }
        true
    }

    /// Returns `true` if messages for `member_id` are being held back.
    #[must_use]
    pub fn is_held(&self, member_id: MemberId) -> bool {
        self.held.contains_key(&member_id)
    }

    /// Stops holding messages for `member_id` and returns the backlog in
    /// arrival order.
    pub fn release(&mut self, member_id: MemberId) -> Vec<Outbound> {
        self.held.remove(&member_id).unwrap_or_default()
    }

    /// The handle of `member_id`, if it is a member.
    #[must_use]
    pub fn member(&self, member_id: MemberId) -> Option<&MemberHandle> {
        self.members.iter().find(|m| m.id() == member_id)
    }

    /// Queues `message` for every member except `exclude`, or appends it to
    /// the backlog of a held member.
    ///
    /// Returns how many members it was queued or held for, plus the members
    /// whose queue refused it.
    pub fn deliver(
        &mut self,
        message: &Outbound,
        exclude: MemberId,
    ) -> (usize, Vec<(MemberId, DeliveryError)>) {
        let mut delivered = 0;
        let mut failed = Vec::new();
        for member in self.members.iter().filter(|m| m.id() != exclude) {
            if let Some(backlog) = self.held.get_mut(&member.id()) {
                backlog.push(message.clone());
                delivered += 1;
                continue;
            }
            match member.try_deliver(message.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => failed.push((member.id(), e)),
            }
        }
        (delivered, failed)
    }

    /// Last edit accepted in this room since it opened.
    #[must_use]
    pub fn latest_edit(&self) -> Option<&str> {
        self.latest_edit.as_deref()
    }

    /// Records `payload` as the room's newest content.
    pub fn record_edit(&mut self, payload: &str) {
        self.latest_edit = Some(payload.to_string());
    }

    /// Removes `member_id`, returning `true` if it was present.
    pub fn remove(&mut self, member_id: MemberId) -> bool {
        self.held.remove(&member_id);
        let before = self.members.len();
        self.members.retain(|m| m.id() != member_id);
        self.members.len() != before
    }
}
