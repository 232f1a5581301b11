//! WebSocket message types for relayed status events.
//!
//! Server → client only. Clients never send application messages; anything
//! they do send is ignored.
//!
//! ```text
//! {"event":"status_update","data":{"details":"…","state":"…","service":null,"metadata":null}}
//! {"event":"status_clear"}
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::status::{StatusEvent, StatusUpdate};

/// All frames the server sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// New status for the identity.
    StatusUpdate(StatusUpdate),

    /// The identity's status was cleared.
    StatusClear,
}

impl ServerMessage {
    /// Encode as a JSON text frame body.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<StatusEvent> for ServerMessage {
    fn from(event: StatusEvent) -> Self {
        match event {
            StatusEvent::Update(update) => ServerMessage::StatusUpdate(update),
            StatusEvent::Clear => ServerMessage::StatusClear,
        }
    }
}
