//! WebSocket adapters for real-time status delivery.
//!
//! # Architecture
//!
//! ```text
//! POST /status/update
//!         │
//!         │ publish(identity, event)
//!         ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      RoomManager                                     │
//! │   Room: identity-1     Room: identity-2                              │
//! │   ├── conn-a (queue)   └── conn-c (queue)                            │
//! │   └── conn-b (queue)                                                 │
//! └─────────────────────────────────────────────────────────────────────┘
//!         │
//!         │ writer task per connection
//!         ▼
//!     WebSocket text frames
//! ```
//!
//! # Components
//!
//! - [`messages`] - Frame protocol types
//! - [`rooms`] - Identity rooms and fan-out
//! - [`handler`] - Axum upgrade handler and connection lifecycle

pub mod handler;
pub mod messages;
pub mod rooms;

pub use handler::{websocket_router, ws_handler, SocketParams, WebSocketState};
pub use messages::ServerMessage;
pub use rooms::RoomManager;
