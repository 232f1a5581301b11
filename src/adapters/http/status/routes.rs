//! Axum router configuration for the ingress endpoint.

use axum::{routing::post, Router};

use super::handlers::{update_status, StatusAppState};

/// Create the ingress router.
///
/// # Routes
/// - `POST /status/update` - Publish a status event
///
/// Rate limiting is layered on by the application router.
pub fn status_routes() -> Router<StatusAppState> {
    Router::new().route("/status/update", post(update_status))
}
