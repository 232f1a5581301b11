//! Application router: every HTTP and WebSocket endpoint of the relay.
//!
//! ```text
//! GET  /                    → consent redirect
//! GET  /authorize           → consent redirect
//! GET  /authorize/reset     → consent redirect (rotate)
//! GET  /authorize/callback  → {"secret": ...}
//! POST /status/update       → 204        (rate limited per origin)
//! GET  /socket?secret=…     → WebSocket
//! ```

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue},
    middleware, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

use crate::adapters::websocket::{websocket_router, WebSocketState};
use crate::ports::{ConnectionRegistry, CredentialStore, OAuthProvider, RateLimiter};

use super::authorize::{authorize_routes, AuthorizeAppState};
use super::middleware::{rate_limit_middleware, IngressRateLimit};
use super::status::{status_routes, StatusAppState};

/// Rate limiter resource name of the ingress route.
pub const STATUS_UPDATE_RESOURCE: &str = "status_update";

/// Everything the relay's endpoints depend on.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<dyn CredentialStore>,
    pub registry: Arc<dyn ConnectionRegistry>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub oauth: Arc<dyn OAuthProvider>,
    /// Capacity of each connection's outbound queue.
    pub connection_buffer: usize,
    /// Use `X-Forwarded-For` / `X-Real-IP` to identify the caller.
    pub trust_proxy_headers: bool,
}

impl AppState {
    fn status(&self) -> StatusAppState {
        StatusAppState {
            credentials: self.credentials.clone(),
            registry: self.registry.clone(),
        }
    }

    fn authorize(&self) -> AuthorizeAppState {
        AuthorizeAppState {
            oauth: self.oauth.clone(),
            credentials: self.credentials.clone(),
        }
    }

    fn websocket(&self) -> WebSocketState {
        WebSocketState::new(
            self.credentials.clone(),
            self.registry.clone(),
            self.connection_buffer,
        )
    }

    fn ingress_rate_limit(&self) -> IngressRateLimit {
        IngressRateLimit::new(
            self.rate_limiter.clone(),
            STATUS_UPDATE_RESOURCE,
            self.trust_proxy_headers,
        )
    }
}

/// Build the complete router.
///
/// The rate limiter guards the ingress route only. CORS is wide open: any
/// origin, any header. `CorsLayer` only answers `Allow-Headers` on
/// preflight, so both wildcards are also stamped on every other response.
pub fn app_router(state: AppState) -> Router {
    let status: Router = status_routes()
        .route_layer(middleware::from_fn_with_state(
            state.ingress_rate_limit(),
            rate_limit_middleware,
        ))
        .with_state(state.status());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    let authorize: Router = authorize_routes().with_state(state.authorize());
    let websocket: Router = websocket_router().with_state(state.websocket());

    Router::new()
        .merge(authorize)
        .merge(status)
        .merge(websocket)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
