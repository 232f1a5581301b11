//! Status events broadcast to an identity's room.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form metadata object forwarded untouched to clients.
pub type StatusMetadata = Map<String, Value>;

/// Payload of an `update` event.
///
/// `service` and `metadata` serialize as `null` when absent; clients rely on
/// the keys always being present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub details: String,
    pub state: String,
    pub service: Option<String>,
    pub metadata: Option<StatusMetadata>,
}

impl StatusUpdate {
    pub fn new(details: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            details: details.into(),
            state: state.into(),
            service: None,
            metadata: None,
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_metadata(mut self, metadata: StatusMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Which kind of status event this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEventKind {
    Update,
    Clear,
}

impl StatusEventKind {
    /// Event name seen by real-time clients.
    pub fn event_name(&self) -> &'static str {
        match self {
            StatusEventKind::Update => "status_update",
            StatusEventKind::Clear => "status_clear",
        }
    }
}

/// A transient event published into one identity's room.
///
/// Not stored after delivery: a connection attaching after publication never
/// sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    Update(StatusUpdate),
    Clear,
}

impl StatusEvent {
    pub fn kind(&self) -> StatusEventKind {
        match self {
            StatusEvent::Update(_) => StatusEventKind::Update,
            StatusEvent::Clear => StatusEventKind::Clear,
        }
    }

    pub fn is_clear(&self) -> bool {
        matches!(self, StatusEvent::Clear)
    }
}

impl From<StatusUpdate> for StatusEvent {
    fn from(update: StatusUpdate) -> Self {
        StatusEvent::Update(update)
    }
}
