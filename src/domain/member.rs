//! Member connection handles and their outbound queues.
//!
//! A [`MemberHandle`] is what the registry stores for each occupant. It
//! never touches the socket: it only enqueues [`Outbound`] messages on a
//! bounded channel that the connection layer drains on its own task, so a
//! slow peer can never stall the broadcaster.

use std::fmt;

use tokio::sync::mpsc;

use super::RoomNotice;

/// Close code sent when a room is at capacity (RFC 6455 "try again later").
pub const CLOSE_ROOM_FULL: u16 = 1013;

/// Unique identifier of one member connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId(uuid::Uuid);

impl MemberId {
    /// Creates a new random `MemberId`.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for MemberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message queued for delivery to one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Full-document edit payload, sent verbatim as a text frame.
    Edit(String),
    /// Membership notice, sent as a JSON text frame.
    Notice(RoomNotice),
    /// Close the connection with the given code and reason.
    Close {
        /// WebSocket close code.
        code: u16,
        /// Human-readable close reason.
        reason: String,
    },
}

/// Why a message could not be queued for a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The member's outbound queue is full.
    #[error("outbound queue full")]
    QueueFull,
    /// The member's writer has gone away.
    #[error("member disconnected")]
    Disconnected,
}

impl<T> From<mpsc::error::TrySendError<T>> for DeliveryError {
    fn from(err: mpsc::error::TrySendError<T>) -> Self {
        match err {
            mpsc::error::TrySendError::Full(_) => Self::QueueFull,
            mpsc::error::TrySendError::Closed(_) => Self::Disconnected,
        }
    }
}

/// Non-owning, cloneable address of one connected member.
#[derive(Debug, Clone)]
pub struct MemberHandle {
    id: MemberId,
    sender: mpsc::Sender<Outbound>,
}

impl MemberHandle {
    /// Creates a handle with a fresh [`MemberId`] and a bounded outbound
    /// queue of `capacity` messages, returning the receiving half for the
    /// connection's writer.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero (see [`tokio::sync::mpsc::channel`]).
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Outbound>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (
            Self {
                id: MemberId::new(),
                sender,
            },
            receiver,
        )
    }

    /// Returns this member's identifier.
    #[must_use]
    pub const fn id(&self) -> MemberId {
        self.id
    }

    /// Queues `message` without waiting. Used by fan-out, where one full
    /// queue must not hold up the other recipients.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError`] if the queue is full or the writer is gone.
    pub fn try_deliver(&self, message: Outbound) -> Result<(), DeliveryError> {
        self.sender.try_send(message).map_err(DeliveryError::from)
    }

    /// Queues `message`, waiting for room in the queue. Used only for
    /// messages addressed to the session's own connection.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Disconnected`] if the writer is gone.
    pub async fn deliver(&self, message: Outbound) -> Result<(), DeliveryError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| DeliveryError::Disconnected)
    }

    /// Resolves once the connection's writer has dropped its receiver.
    pub async fn closed(&self) {
        self.sender.closed().await;
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn handles_get_distinct_ids() {
        let (a, _rx_a) = MemberHandle::channel(4);
        let (b, _rx_b) = MemberHandle::channel(4);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[tokio::test]
    async fn try_deliver_reaches_receiver() {
        let (member, mut rx) = MemberHandle::channel(4);
        assert!(member.try_deliver(Outbound::Edit("abc".to_string())).is_ok());
        assert_eq!(rx.recv().await, Some(Outbound::Edit("abc".to_string())));
    }

    #[test]
    fn try_deliver_reports_full_queue() {
        let (member, _rx) = MemberHandle::channel(1);
        assert!(member.try_deliver(Outbound::Edit("1".to_string())).is_ok());
        assert_eq!(
            member.try_deliver(Outbound::Edit("2".to_string())),
            Err(DeliveryError::QueueFull)
        );
    }

    #[tokio::test]
    async fn deliver_reports_dropped_receiver() {
        let (member, rx) = MemberHandle::channel(1);
        drop(rx);
        assert_eq!(
            member.deliver(Outbound::Edit("x".to_string())).await,
            Err(DeliveryError::Disconnected)
        );
        member.closed().await;
    }
}
