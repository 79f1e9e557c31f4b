//! WebSocket connection plumbing for one room member.
//!
//! The socket is split in two. A writer task drains the member's outbound
//! queue into the sink; the session consumes inbound text frames on the
//! upgrade task. Either side finishing ends the other: a closed inbound
//! stream ends the session, and a failed write drops the queue, which the
//! session observes as the writer closing.

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, Stream, StreamExt, future};
use tokio::sync::mpsc;

use super::messages::to_frame;
use crate::domain::Outbound;
use crate::service::{PendingSession, SessionOutcome};

/// Runs one member connection from upgrade to close.
pub async fn run_connection(
    socket: WebSocket,
    session: PendingSession,
    outbound: mpsc::Receiver<Outbound>,
) {
    let (ws_tx, ws_rx) = socket.split();
    let writer = tokio::spawn(write_outbound(ws_tx, outbound));

    let outcome = session.run(text_frames(ws_rx)).await;
    match outcome {
        SessionOutcome::Rejected => tracing::debug!("ws connection rejected"),
        SessionOutcome::Closed { persisted } => {
            tracing::debug!(persisted, "ws session closed");
        }
    }

    if let Err(e) = writer.await {
        tracing::warn!(error = %e, "ws writer task failed");
    }
}

/// Yields the payload of each inbound text frame until the peer closes or
/// the transport fails. Binary frames are ignored; pings are answered by
/// the socket itself.
fn text_frames(ws_rx: SplitStream<WebSocket>) -> impl Stream<Item = String> + Unpin + Send {
    ws_rx
        .take_while(|frame| {
            let open = match frame {
                Ok(Message::Close(_)) => false,
                Ok(_) => true,
                Err(e) => {
                    tracing::debug!(error = %e, "ws read failed");
                    false
                }
            };
            future::ready(open)
        })
        .filter_map(|frame| {
            future::ready(match frame {
                Ok(Message::Text(text)) => Some(text.as_str().to_owned()),
                _ => None,
            })
        })
}

/// Drains the outbound queue into the socket until every sender is gone,
/// a close frame has been written, or a write fails.
async fn write_outbound(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Outbound>,
) {
    while let Some(message) = outbound.recv().await {
        let closing = matches!(message, Outbound::Close { .. });
        let Some(frame) = to_frame(message) else {
            continue;
        };
        if let Err(e) = ws_tx.send(frame).await {
            tracing::debug!(error = %e, "ws write failed");
            return;
        }
        if closing {
            break;
        }
    }
    // Flushes any close reply the socket queued for the peer.
    if let Err(e) = ws_tx.close().await {
        tracing::trace!(error = %e, "ws close after drain failed");
    }
}
