//! Mapping from queued [`Outbound`] messages to WebSocket frames.
//!
//! Edits travel as raw text frames. Notices travel as text frames holding
//! a single-key JSON object, which is how clients tell the two apart.

use axum::extract::ws::{CloseFrame, Message};

use crate::domain::Outbound;

/// Converts a queued message into the frame written to the socket.
///
/// Returns `None` if a notice cannot be serialized; the caller skips it.
#[must_use]
pub fn to_frame(outbound: Outbound) -> Option<Message> {
    match outbound {
        Outbound::Edit(text) => Some(Message::text(text)),
        Outbound::Notice(notice) => match notice.to_json() {
            Ok(json) => Some(Message::text(json)),
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize room notice");
                None
            }
        },
        Outbound::Close { code, reason } => Some(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        }))),
    }
}
