//! Per-connection room session lifecycle.
//!
//! ```text
//! [Pending] --join ok--> [Active] --edit--> [Active]
//! [Pending] --room full--> [Rejected]
//! [Active] --disconnect / writer fault--> flush, leave, notify --> [Closed]
//! ```
//!
//! Each phase is its own type. [`PendingSession::admit`] consumes the
//! pending session and [`ActiveSession::close`] consumes the active one, so
//! a session can be flushed at most once.

use std::sync::Arc;

use futures_util::{Stream, StreamExt};

use crate::domain::member::CLOSE_ROOM_FULL;
use crate::domain::{MemberHandle, Outbound, RoomId, RoomNotice, RoomRegistry};
use crate::persistence::RoomStore;

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The room was full; the connection was closed without being admitted.
    Rejected,
    /// The member was admitted and has since left.
    Closed {
        /// Whether the final content reached the store.
        persisted: bool,
    },
}

/// Result of a join attempt.
#[derive(Debug)]
pub enum Admission {
    /// The member is in the room.
    Active(ActiveSession),
    /// The room was at capacity; a close was queued for the connection.
    Rejected,
}

/// Builds the human-readable close reason for a full room.
#[must_use]
pub fn room_full_reason(room_id: RoomId, capacity: usize) -> String {
    format!("Room {room_id} is full (Max: {capacity})")
}

/// A connection that has asked to join a room but is not yet a member.
#[derive(Debug)]
pub struct PendingSession {
    registry: Arc<RoomRegistry>,
    store: Arc<dyn RoomStore>,
    room_id: RoomId,
    member: MemberHandle,
}

impl PendingSession {
    /// Prepares a session for `member` in `room_id`.
    #[must_use]
    pub fn new(
        registry: Arc<RoomRegistry>,
        store: Arc<dyn RoomStore>,
        room_id: RoomId,
        member: MemberHandle,
    ) -> Self {
        Self {
            registry,
            store,
            room_id,
            member,
        }
    }

    /// Attempts to join the room.
    ///
    /// On success the other members are notified, the persisted content is
    /// loaded (empty on a miss or a store failure) and, if non-empty, sent
    /// to the new member as its first edit. Room traffic that arrives while
    /// the content loads is queued after it. On rejection a room-full close
    /// is queued and nothing else happens.
    pub async fn admit(self) -> Admission {
        let Self {
            registry,
            store,
            room_id,
            member,
        } = self;
        let member_id = member.id();

        if !registry.join_held(room_id, member.clone()).await {
            let capacity = registry.capacity();
            tracing::info!(%room_id, %member_id, capacity, "room full, rejecting member");
            let close = Outbound::Close {
                code: CLOSE_ROOM_FULL,
                reason: room_full_reason(room_id, capacity),
            };
            if member.deliver(close).await.is_err() {
                tracing::debug!(%room_id, %member_id, "rejected member already gone");
            }
            return Admission::Rejected;
        }

        registry
            .broadcast_notice(room_id, RoomNotice::joined(), member_id)
            .await;

        let current_state = match store.load(room_id).await {
            Ok(content) => content.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(%room_id, error = %e, "failed to load room content, starting empty");
                String::new()
            }
        };

        let initial = (!current_state.is_empty()).then(|| current_state.clone());
        registry.release(room_id, member_id, initial).await;

        tracing::info!(%room_id, %member_id, "member joined");
        Admission::Active(ActiveSession {
            registry,
            store,
            room_id,
            member,
            current_state,
        })
    }

    /// Drives the whole lifecycle: admission, the edit loop over `inbound`,
    /// and cleanup.
    ///
    /// The loop ends when `inbound` is exhausted (peer closed or transport
    /// error) or when the connection's writer drops its queue.
    pub async fn run<S>(self, mut inbound: S) -> SessionOutcome
    where
        S: Stream<Item = String> + Unpin,
    {
        let mut session = match self.admit().await {
            Admission::Active(session) => session,
            Admission::Rejected => return SessionOutcome::Rejected,
        };
        let member = session.member().clone();

        loop {
            tokio::select! {
                next = inbound.next() => match next {
                    Some(payload) => {
                        session.apply_edit(payload).await;
                    }
                    None => break,
                },
                () = member.closed() => {
                    tracing::debug!(room_id = %session.room_id(), member_id = %member.id(), "writer closed");
                    break;
                }
            }
        }

        session.close().await
    }
}

/// A connection that is a member of its room.
#[derive(Debug)]
pub struct ActiveSession {
    registry: Arc<RoomRegistry>,
    store: Arc<dyn RoomStore>,
    room_id: RoomId,
    member: MemberHandle,
    current_state: String,
}

impl ActiveSession {
    /// The room this session belongs to.
    #[must_use]
    pub const fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// This session's member handle.
    #[must_use]
    pub const fn member(&self) -> &MemberHandle {
        &self.member
    }

    /// Content loaded at join, replaced by each edit this session sends.
    ///
    /// Edits received from peers are not tracked here; [`Self::close`]
    /// reads those from the room.
    #[must_use]
    pub fn current_state(&self) -> &str {
        &self.current_state
    }

    /// Replaces the current state with `payload` and forwards it to the
    /// other members. Returns how many members it was queued for.
    pub async fn apply_edit(&mut self, payload: String) -> usize {
        self.current_state = payload;
        self.registry
            .broadcast(self.room_id, &self.current_state, self.member.id())
            .await
    }

    /// Flushes the room's content, leaves the room and tells the remaining
    /// members.
    ///
    /// The flushed content is the room's last broadcast edit, whoever sent
    /// it. That edit may predate this session's join, so a session that
    /// never edited still saves the room's newest content rather than what
    /// it loaded. Only when the room has seen no edit since it opened is
    /// [`Self::current_state`] saved. A failed flush is logged; the member
    /// still leaves.
    pub async fn close(self) -> SessionOutcome {
        let Self {
            registry,
            store,
            room_id,
            member,
            current_state,
        } = self;
        let member_id = member.id();

        let content = registry
            .latest_edit(room_id)
            .await
            .unwrap_or(current_state);

        let persisted = match store.save(room_id, &content).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(%room_id, %member_id, error = %e, "failed to persist room content");
                false
            }
        };

        registry.leave(room_id, member_id).await;
        registry
            .broadcast_notice(room_id, RoomNotice::left(), member_id)
            .await;

        tracing::info!(%room_id, %member_id, persisted, "member left");
        SessionOutcome::Closed { persisted }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use futures_util::stream;
    use tokio::sync::{Notify, mpsc};

    use super::*;
    use crate::error::ServerError;
    use crate::persistence::{InMemoryRoomStore, RoomRecord};

    /// Store that records every save and can be told to fail.
    #[derive(Debug, Default)]
    struct RecordingStore {
        inner: InMemoryRoomStore,
        saves: Mutex<Vec<(RoomId, String)>>,
        fail_load: bool,
        fail_save: bool,
        hold_next_load: AtomicBool,
        load_gate: Notify,
    }

    impl RecordingStore {
        fn saves(&self) -> Vec<(RoomId, String)> {
            self.saves.lock().map(|s| s.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl RoomStore for RecordingStore {
        async fn load(&self, room_id: RoomId) -> Result<Option<String>, ServerError> {
            if self.fail_load {
                return Err(ServerError::PersistenceError("load refused".to_string()));
            }
            if self.hold_next_load.swap(false, Ordering::SeqCst) {
                self.load_gate.notified().await;
            }
            self.inner.load(room_id).await
        }

        async fn save(&self, room_id: RoomId, content: &str) -> Result<(), ServerError> {
            if let Ok(mut saves) = self.saves.lock() {
                saves.push((room_id, content.to_string()));
            }
            if self.fail_save {
                return Err(ServerError::PersistenceError("save refused".to_string()));
            }
            self.inner.save(room_id, content).await
        }

        async fn create(&self) -> Result<RoomRecord, ServerError> {
            self.inner.create().await
        }

        async fn get(&self, room_id: RoomId) -> Result<Option<RoomRecord>, ServerError> {
            self.inner.get(room_id).await
        }

        async fn list(&self) -> Result<Vec<RoomRecord>, ServerError> {
            self.inner.list().await
        }
    }

    struct Harness {
        registry: Arc<RoomRegistry>,
        store: Arc<RecordingStore>,
        room: RoomId,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_store(RecordingStore::default())
        }

        fn with_store(store: RecordingStore) -> Self {
            Self {
                registry: Arc::new(RoomRegistry::new(2)),
                store: Arc::new(store),
                room: RoomId::new(),
            }
        }

        fn pending(&self) -> (PendingSession, mpsc::Receiver<Outbound>) {
            let (member, rx) = MemberHandle::channel(16);
            let store: Arc<dyn RoomStore> = Arc::clone(&self.store) as Arc<dyn RoomStore>;
            (
                PendingSession::new(Arc::clone(&self.registry), store, self.room, member),
                rx,
            )
        }

        async fn active(&self) -> (ActiveSession, mpsc::Receiver<Outbound>) {
            let (pending, rx) = self.pending();
            let Admission::Active(session) = pending.admit().await else {
                panic!("expected admission");
            };
            (session, rx)
        }
    }

    #[tokio::test]
    async fn first_member_gets_no_initial_state_for_new_room() {
        let h = Harness::new();
        let (session, mut rx) = h.active().await;
        assert_eq!(session.current_state(), "");
        assert!(rx.try_recv().is_err());
        assert_eq!(h.registry.occupancy(h.room).await, 1);
    }

    #[tokio::test]
    async fn late_joiner_receives_persisted_content_first() {
        let h = Harness::new();
        assert!(h.store.save(h.room, "hello").await.is_ok());

        let (session, mut rx) = h.active().await;
        assert_eq!(session.current_state(), "hello");
        assert_eq!(rx.recv().await, Some(Outbound::Edit("hello".to_string())));
    }

    #[tokio::test]
    async fn replay_precedes_edits_made_while_loading() {
        let h = Harness::new();
        assert!(h.store.save(h.room, "hello").await.is_ok());
        h.store.hold_next_load.store(true, Ordering::SeqCst);

        let (pending_a, mut rx_a) = h.pending();
        let admit_a = tokio::spawn(pending_a.admit());
        while h.store.hold_next_load.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }

        let (mut b, mut rx_b) = h.active().await;
        assert_eq!(rx_b.recv().await, Some(Outbound::Edit("hello".to_string())));
        assert_eq!(b.apply_edit("newer".to_string()).await, 1);
        assert!(rx_a.try_recv().is_err());

        h.store.load_gate.notify_one();
        let Ok(Admission::Active(a)) = admit_a.await else {
            panic!("expected admission");
        };
        assert_eq!(a.current_state(), "hello");
        assert_eq!(rx_a.recv().await, Some(Outbound::Edit("hello".to_string())));
        assert_eq!(rx_a.recv().await, Some(Outbound::Notice(RoomNotice::joined())));
        assert_eq!(rx_a.recv().await, Some(Outbound::Edit("newer".to_string())));
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn load_failure_degrades_to_empty_state() {
        let h = Harness::with_store(RecordingStore {
            fail_load: true,
            ..RecordingStore::default()
        });
        let (session, mut rx) = h.active().await;
        assert_eq!(session.current_state(), "");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn second_member_triggers_joined_notice() {
        let h = Harness::new();
        let (_a, mut rx_a) = h.active().await;
        let (_b, mut rx_b) = h.active().await;

        assert_eq!(rx_a.recv().await, Some(Outbound::Notice(RoomNotice::joined())));
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn third_member_is_rejected_with_capacity_in_reason() {
        let h = Harness::new();
        let (a, mut rx_a) = h.active().await;
        let (b, _rx_b) = h.active().await;
        let _ = rx_a.recv().await;

        let (pending, mut rx_c) = h.pending();
        assert!(matches!(pending.admit().await, Admission::Rejected));

        let Some(Outbound::Close { code, reason }) = rx_c.recv().await else {
            panic!("expected a close instruction");
        };
        assert_eq!(code, CLOSE_ROOM_FULL);
        assert_eq!(reason, format!("Room {} is full (Max: 2)", h.room));
        assert!(reason.contains("Max: 2"));

        assert_eq!(h.registry.occupancy(h.room).await, 2);
        assert!(h.registry.contains(h.room, a.member().id()).await);
        assert!(h.registry.contains(h.room, b.member().id()).await);
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn edits_reach_peer_as_text_in_order() {
        let h = Harness::new();
        let (mut a, _rx_a) = h.active().await;
        let (b, mut rx_b) = h.active().await;

        assert_eq!(a.apply_edit("e1".to_string()).await, 1);
        assert_eq!(a.apply_edit("e2".to_string()).await, 1);

        assert_eq!(rx_b.recv().await, Some(Outbound::Edit("e1".to_string())));
        assert_eq!(rx_b.recv().await, Some(Outbound::Edit("e2".to_string())));
        assert_eq!(a.current_state(), "e2");
        assert_eq!(b.current_state(), "");
    }

    #[tokio::test]
    async fn disconnect_flushes_last_edit_exactly_once() {
        let h = Harness::new();
        let (mut a, _rx) = h.active().await;
        a.apply_edit("draft".to_string()).await;
        a.apply_edit("final".to_string()).await;

        assert_eq!(a.close().await, SessionOutcome::Closed { persisted: true });
        assert_eq!(h.store.saves(), vec![(h.room, "final".to_string())]);
        assert_eq!(h.registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn disconnect_without_edits_flushes_loaded_state() {
        let h = Harness::new();
        assert!(h.store.save(h.room, "kept").await.is_ok());
        let (a, _rx) = h.active().await;

        a.close().await;
        let saves = h.store.saves();
        assert_eq!(saves.last(), Some(&(h.room, "kept".to_string())));
        assert_eq!(saves.len(), 2);
    }

    #[tokio::test]
    async fn save_failure_still_leaves_and_notifies() {
        let h = Harness::with_store(RecordingStore {
            fail_save: true,
            ..RecordingStore::default()
        });
        let (a, mut rx_a) = h.active().await;
        let (b, _rx_b) = h.active().await;
        let b_id = b.member().id();
        let _ = rx_a.recv().await;

        assert_eq!(b.close().await, SessionOutcome::Closed { persisted: false });
        assert_eq!(h.store.saves().len(), 1);
        assert_eq!(h.registry.occupancy(h.room).await, 1);
        assert!(!h.registry.contains(h.room, b_id).await);
        assert!(h.registry.contains(h.room, a.member().id()).await);
        assert_eq!(rx_a.recv().await, Some(Outbound::Notice(RoomNotice::left())));
    }

    #[tokio::test]
    async fn scenario_two_members_then_replacement() {
        let h = Harness::new();

        let (mut a, mut rx_a) = h.active().await;
        assert!(rx_a.try_recv().is_err());

        let (b, mut rx_b) = h.active().await;
        assert_eq!(rx_a.recv().await, Some(Outbound::Notice(RoomNotice::joined())));

        a.apply_edit("abc".to_string()).await;
        assert_eq!(rx_b.recv().await, Some(Outbound::Edit("abc".to_string())));

        assert!(rx_b.try_recv().is_err());

        // B flushes the room's newest content even though A authored it.
        b.close().await;
        assert_eq!(h.store.saves(), vec![(h.room, "abc".to_string())]);
        assert_eq!(rx_a.recv().await, Some(Outbound::Notice(RoomNotice::left())));

        // A is still present, so C takes the freed slot and sees the flush.
        let (c, mut rx_c) = h.active().await;
        assert_eq!(rx_c.recv().await, Some(Outbound::Edit("abc".to_string())));
        assert_eq!(rx_a.recv().await, Some(Outbound::Notice(RoomNotice::joined())));
        assert_eq!(h.registry.occupancy(h.room).await, 2);
        assert!(h.registry.contains(h.room, a.member().id()).await);
        assert!(h.registry.contains(h.room, c.member().id()).await);
    }

    #[tokio::test]
    async fn last_member_flushes_peer_edits() {
        let h = Harness::new();
        let (a, _rx_a) = h.active().await;
        let (mut b, _rx_b) = h.active().await;

        b.apply_edit("from b".to_string()).await;
        b.close().await;
        a.close().await;

        assert_eq!(
            h.store.saves(),
            vec![
                (h.room, "from b".to_string()),
                (h.room, "from b".to_string()),
            ]
        );
        assert_eq!(h.registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn idle_session_flushes_room_edit_made_before_it_joined() {
        let h = Harness::new();
        assert!(h.store.save(h.room, "v1").await.is_ok());
        let (mut a, _rx_a) = h.active().await;
        a.apply_edit("v2".to_string()).await;

        let (b, mut rx_b) = h.active().await;
        assert_eq!(rx_b.recv().await, Some(Outbound::Edit("v1".to_string())));
        assert_eq!(b.current_state(), "v1");

        b.close().await;
        assert_eq!(h.store.saves().last(), Some(&(h.room, "v2".to_string())));
    }

    #[tokio::test]
    async fn run_applies_stream_then_cleans_up() {
        let h = Harness::new();
        let (pending, _rx) = h.pending();

        let inbound = stream::iter(vec!["one".to_string(), "final".to_string()]);
        let outcome = pending.run(inbound).await;

        assert_eq!(outcome, SessionOutcome::Closed { persisted: true });
        assert_eq!(h.store.saves(), vec![(h.room, "final".to_string())]);
        assert_eq!(h.registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn run_ends_when_writer_drops_queue() {
        let h = Harness::new();
        let (pending, rx) = h.pending();
        drop(rx);

        let outcome = pending.run(stream::pending::<String>()).await;
        assert_eq!(outcome, SessionOutcome::Closed { persisted: true });
        assert_eq!(h.registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn run_reports_rejection() {
        let h = Harness::new();
        let (_a, _rx_a) = h.active().await;
        let (_b, _rx_b) = h.active().await;

        let (pending, _rx_c) = h.pending();
        let outcome = pending.run(stream::iter(vec!["ignored".to_string()])).await;
        assert_eq!(outcome, SessionOutcome::Rejected);
        assert!(h.store.saves().is_empty());
    }
}
