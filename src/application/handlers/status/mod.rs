//! Status command handlers.

mod publish_status;

pub use publish_status::{PublishStatusCommand, PublishStatusHandler, PublishStatusResult};
