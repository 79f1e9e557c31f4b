//! # pairpad
//!
//! Real-time collaborative text rooms over WebSocket.
//!
//! Clients connect to `/ws/room/{id}`, receive the room's last persisted
//! text, and exchange full-document edits with the other occupants. Each
//! room admits a bounded number of members; the content is written back
//! to the store when a member disconnects.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler + writer task (ws/)
//!     │
//!     ├── RoomService, session lifecycle (service/)
//!     │
//!     ├── RoomRegistry (domain/)
//!     │
//!     └── RoomStore: PostgreSQL or in-memory (persistence/)
//! ```

pub mod api;
pub mod app;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
