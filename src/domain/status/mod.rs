//! Status module - the `update`/`clear` events relayed to clients.

mod event;

pub use event::{StatusEvent, StatusEventKind, StatusMetadata, StatusUpdate};
