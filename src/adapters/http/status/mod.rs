//! HTTP adapter for the ingress path.
//!
//! - `POST /status/update` - Publish an update or a clear for the caller's identity

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::UpdateStatusRequest;
pub use handlers::{update_status, StatusAppState};
pub use routes::status_routes;
