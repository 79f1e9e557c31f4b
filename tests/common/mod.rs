//! Shared harness: serves the full router on a loopback port.

#![allow(dead_code, clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use pairpad::app::build_app;
use pairpad::app_state::AppState;
use pairpad::domain::{RoomId, RoomRegistry};
use pairpad::persistence::{InMemoryRoomStore, RoomStore};
use pairpad::service::RoomService;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct TestServer {
    pub addr: SocketAddr,
    pub service: Arc<RoomService>,
    pub store: Arc<InMemoryRoomStore>,
}

impl TestServer {
    pub async fn start() -> Self {
        let store = Arc::new(InMemoryRoomStore::new());
        let registry = Arc::new(RoomRegistry::new(2));
        let dyn_store: Arc<dyn RoomStore> = Arc::clone(&store) as Arc<dyn RoomStore>;
        let service = Arc::new(RoomService::new(registry, dyn_store, 64));
        let app = build_app(AppState {
            room_service: Arc::clone(&service),
        });

        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            service,
            store,
        }
    }

    pub fn http(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub async fn connect(&self, room: RoomId) -> Client {
        let url = format!("ws://{}/ws/room/{room}", self.addr);
        let Ok((ws, _)) = tokio_tungstenite::connect_async(url).await else {
            panic!("websocket handshake failed");
        };
        ws
    }

    /// Waits until the registry reports `expected` members in `room`.
    pub async fn wait_for_occupancy(&self, room: RoomId, expected: usize) {
        for _ in 0..200 {
            if self.service.registry().occupancy(room).await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("room never reached occupancy {expected}");
    }
}

/// Next frame from `ws`, failing the test after five seconds.
pub async fn next_frame(ws: &mut Client) -> Message {
    match tokio::time::timeout(Duration::from_secs(5), ws.next()).await {
        Ok(Some(Ok(message))) => message,
        Ok(other) => panic!("connection ended unexpectedly: {other:?}"),
        Err(_) => panic!("timed out waiting for a frame"),
    }
}

/// Next frame, which must be a text frame.
pub async fn next_text(ws: &mut Client) -> String {
    match next_frame(ws).await {
        Message::Text(text) => text.as_str().to_owned(),
        other => panic!("expected text frame, got {other:?}"),
    }
}
