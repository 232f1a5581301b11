//! HTTP adapters - the relay's public surface.
//!
//! - `status` - Ingress endpoint for producers
//! - `authorize` - Browser-facing OAuth flow
//! - `middleware` - Per-origin rate limiting
//! - `router` - Composition of all routes, CORS and tracing

pub mod authorize;
pub mod error;
pub mod middleware;
pub mod router;
pub mod status;

pub use error::{ApiError, ErrorResponse};
pub use router::{app_router, AppState, STATUS_UPDATE_RESOURCE};
