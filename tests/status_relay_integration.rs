//! Integration tests for the ingress path.
//!
//! These drive the full application router with in-memory adapters:
//! 1. Producers post updates and clears with their secret
//! 2. Subscribed connections of that identity receive them in order
//! 3. Validation, authentication and rate limiting reject before any delivery

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tower::ServiceExt;

use presence_relay::adapters::credentials::InMemoryCredentialStore;
use presence_relay::adapters::http::{app_router, AppState};
use presence_relay::adapters::oauth::MockOAuthProvider;
use presence_relay::adapters::rate_limiter::{InMemoryRateLimiter, RateLimitConfig};
use presence_relay::adapters::websocket::{RoomManager, ServerMessage};
use presence_relay::config::ServerConfig;
use presence_relay::domain::foundation::{ClientSecret, ConnectionId, IdentityId};
use presence_relay::domain::status::{StatusEvent, StatusUpdate};
use presence_relay::ports::{ConnectionHandle, ConnectionRegistry, CredentialStore};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Relay {
    app: Router,
    store: Arc<InMemoryCredentialStore>,
    rooms: Arc<RoomManager>,
}

impl Relay {
    fn new() -> Self {
        Self::with_rate_limit(RateLimitConfig::per_ip(1_000, 1_000))
    }

    fn with_rate_limit(config: RateLimitConfig) -> Self {
        Self::build(config, true)
    }

    fn build(config: RateLimitConfig, trust_proxy_headers: bool) -> Self {
        let store = Arc::new(InMemoryCredentialStore::new());
        let rooms = Arc::new(RoomManager::new());
        let app = app_router(AppState {
            credentials: store.clone(),
            registry: rooms.clone(),
            rate_limiter: Arc::new(InMemoryRateLimiter::new(config)),
            oauth: Arc::new(MockOAuthProvider::new()),
            connection_buffer: 16,
            trust_proxy_headers,
        });
        Self { app, store, rooms }
    }

    async fn link(&self, identity: &str) -> ClientSecret {
        self.store
            .issue(&IdentityId::new(identity).unwrap())
            .await
            .unwrap()
    }

    fn subscribe(&self, identity: &str) -> mpsc::Receiver<StatusEvent> {
        let (handle, rx) = ConnectionHandle::channel(ConnectionId::new(), 16);
        self.rooms
            .attach(&IdentityId::new(identity).unwrap(), handle)
            .unwrap();
        rx
    }

    async fn post(&self, body: impl Into<Body>) -> Response {
        self.post_from("203.0.113.7", body).await
    }

    async fn post_from(&self, origin: &str, body: impl Into<Body>) -> Response {
        let request = Request::post("/status/update")
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-Forwarded-For", origin)
            .body(body.into())
            .unwrap();
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Post as a direct TCP peer, with whatever forwarding header it claims.
    async fn post_as_peer(&self, peer: &str, forwarded_for: &str, body: impl Into<Body>) -> Response {
        let peer: SocketAddr = peer.parse().unwrap();
        let mut request = Request::post("/status/update")
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-Forwarded-For", forwarded_for)
            .body(body.into())
            .unwrap();
        request.extensions_mut().insert(ConnectInfo(peer));
        self.app.clone().oneshot(request).await.unwrap()
    }
}

async fn error_of(response: Response) -> String {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    json["error"].as_str().unwrap_or_default().to_string()
}

fn wire(event: StatusEvent) -> Value {
    serde_json::from_str(&ServerMessage::from(event).to_json().unwrap()).unwrap()
}

// =============================================================================
// Delivery
// =============================================================================

#[tokio::test]
async fn update_reaches_every_connection_of_the_identity() {
    let relay = Relay::new();
    let secret = relay.link("8035").await;
    let mut phone = relay.subscribe("8035");
    let mut laptop = relay.subscribe("8035");

    let response = relay
        .post(json!({"secret": secret.expose(), "details": "d", "state": "s"}).to_string())
        .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    for rx in [&mut phone, &mut laptop] {
        let event = rx.recv().await.unwrap();
        assert_eq!(
            wire(event),
            json!({
                "event": "status_update",
                "data": {"details": "d", "state": "s", "service": null, "metadata": null}
            })
        );
    }
}

#[tokio::test]
async fn other_identities_receive_nothing() {
    let relay = Relay::new();
    let secret = relay.link("alice").await;
    let mut bob = relay.subscribe("bob");

    relay
        .post(json!({"secret": secret.expose(), "details": "d", "state": "s"}).to_string())
        .await;

    assert!(bob.try_recv().is_err());
}

#[tokio::test]
async fn clear_ignores_payload_fields() {
    let relay = Relay::new();
    let secret = relay.link("8035").await;
    let mut rx = relay.subscribe("8035");

    let response = relay
        .post(json!({"secret": secret.expose(), "clear": true, "details": "ignored"}).to_string())
        .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(wire(rx.recv().await.unwrap()), json!({"event": "status_clear"}));
}

#[tokio::test]
async fn numeric_clear_flag_is_honoured() {
    let relay = Relay::new();
    let secret = relay.link("8035").await;
    let mut rx = relay.subscribe("8035");

    let cleared = relay
        .post(json!({"secret": secret.expose(), "clear": 1}).to_string())
        .await;
    assert_eq!(cleared.status(), StatusCode::NO_CONTENT);
    assert_eq!(rx.recv().await, Some(StatusEvent::Clear));

    // 0 is not a clear, so an update payload is required
    let not_cleared = relay
        .post(json!({"secret": secret.expose(), "clear": 0}).to_string())
        .await;
    assert_eq!(error_of(not_cleared).await, "Missing body parameters");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn clear_then_update_arrive_in_order() {
    let relay = Relay::new();
    let secret = relay.link("8035").await;
    let mut rx = relay.subscribe("8035");

    relay
        .post(json!({"secret": secret.expose(), "details": "one", "state": "s"}).to_string())
        .await;
    relay
        .post(json!({"secret": secret.expose(), "clear": true}).to_string())
        .await;
    relay
        .post(json!({"secret": secret.expose(), "details": "two", "state": "s"}).to_string())
        .await;

    assert_eq!(rx.recv().await, Some(StatusUpdate::new("one", "s").into()));
    assert_eq!(rx.recv().await, Some(StatusEvent::Clear));
    assert_eq!(rx.recv().await, Some(StatusUpdate::new("two", "s").into()));
}

#[tokio::test]
async fn secret_is_trimmed_before_lookup() {
    let relay = Relay::new();
    let secret = relay.link("8035").await;
    let mut rx = relay.subscribe("8035");

    let padded = format!("  {}\n", secret.expose());
    let response = relay
        .post(json!({"secret": padded, "clear": true}).to_string())
        .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(rx.recv().await, Some(StatusEvent::Clear));
}

#[tokio::test]
async fn service_and_metadata_are_forwarded() {
    let relay = Relay::new();
    let secret = relay.link("8035").await;
    let mut rx = relay.subscribe("8035");

    relay
        .post(
            json!({
                "secret": secret.expose(),
                "details": "Song",
                "state": "Artist",
                "service": "spotify",
                "metadata": {"album": "Album", "duration": 215}
            })
            .to_string(),
        )
        .await;

    let frame = wire(rx.recv().await.unwrap());
    assert_eq!(frame["data"]["service"], "spotify");
    assert_eq!(frame["data"]["metadata"]["duration"], 215);
}

// =============================================================================
// Rejections
// =============================================================================

#[tokio::test]
async fn non_json_body_is_no_body() {
    let relay = Relay::new();

    let response = relay.post("not json").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(response).await, "No body");
}

#[tokio::test]
async fn secret_without_payload_is_missing_parameters() {
    let relay = Relay::new();
    let mut rx = relay.subscribe("8035");

    let response = relay.post(json!({"secret": "bogus"}).to_string()).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(response).await, "Missing body parameters");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn empty_details_is_missing_parameters() {
    let relay = Relay::new();
    let secret = relay.link("8035").await;

    let response = relay
        .post(json!({"secret": secret.expose(), "details": "", "state": "s"}).to_string())
        .await;

    assert_eq!(error_of(response).await, "Missing body parameters");
}

#[tokio::test]
async fn non_string_details_is_missing_parameters() {
    let relay = Relay::new();
    let secret = relay.link("8035").await;

    let response = relay
        .post(json!({"secret": secret.expose(), "details": 7, "state": "s"}).to_string())
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(response).await, "Missing body parameters");
}

#[tokio::test]
async fn unknown_secret_is_rejected_without_delivery() {
    let relay = Relay::new();
    relay.link("8035").await;
    let mut rx = relay.subscribe("8035");

    let response = relay
        .post(json!({"secret": "nope", "details": "d", "state": "s"}).to_string())
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_of(response).await, "Invalid secret");
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn third_request_in_a_second_is_rate_limited_before_lookup() {
    let relay = Relay::with_rate_limit(RateLimitConfig::per_ip(2, 1_000));
    let secret = relay.link("8035").await;
    let body = json!({"secret": secret.expose(), "clear": true}).to_string();

    let first = relay.post_from("198.51.100.1", body.clone()).await;
    let second = relay.post_from("198.51.100.1", body.clone()).await;
    let third = relay.post_from("198.51.100.1", body.clone()).await;

    assert_eq!(first.status(), StatusCode::NO_CONTENT);
    assert_eq!(second.status(), StatusCode::NO_CONTENT);
    assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(third.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(relay.store.lookup_count(), 2);

    // A different origin still has its full budget
    let other = relay.post_from("198.51.100.2", body).await;
    assert_eq!(other.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn forged_forwarding_headers_share_the_peer_budget_by_default() {
    let trust = ServerConfig::default().trust_proxy_headers;
    let relay = Relay::build(RateLimitConfig::per_ip(2, 1_000), trust);
    let secret = relay.link("8035").await;
    let body = json!({"secret": secret.expose(), "clear": true}).to_string();

    let mut statuses = Vec::new();
    for i in 0..3 {
        let forged = format!("10.9.9.{i}");
        let response = relay.post_as_peer("1.2.3.4:5000", &forged, body.clone()).await;
        statuses.push(response.status());
    }

    assert_eq!(
        statuses,
        [
            StatusCode::NO_CONTENT,
            StatusCode::NO_CONTENT,
            StatusCode::TOO_MANY_REQUESTS
        ]
    );
    assert_eq!(relay.store.lookup_count(), 2);
}

#[tokio::test]
async fn rate_limit_does_not_apply_to_authorization() {
    let relay = Relay::with_rate_limit(RateLimitConfig::per_ip(1, 1_000));

    for _ in 0..3 {
        let response = relay
            .app
            .clone()
            .oneshot(
                Request::get("/authorize")
                    .header("X-Forwarded-For", "198.51.100.1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}

// =============================================================================
// CORS
// =============================================================================

#[tokio::test]
async fn responses_allow_any_origin_and_header() {
    let relay = Relay::new();
    let secret = relay.link("8035").await;

    for body in [
        "{}".to_string(),
        json!({"secret": secret.expose(), "clear": true}).to_string(),
    ] {
        let request = Request::post("/status/update")
            .header(header::ORIGIN, "https://player.example")
            .header("X-Forwarded-For", "203.0.113.9")
            .body(Body::from(body))
            .unwrap();
        let response = relay.app.clone().oneshot(request).await.unwrap();

        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");
    }
}

#[tokio::test]
async fn cors_headers_present_without_origin() {
    let relay = Relay::new();

    let response = relay
        .app
        .clone()
        .oneshot(Request::get("/authorize").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");
}

#[tokio::test]
async fn preflight_allows_any_header() {
    let relay = Relay::new();

    let request = Request::options("/status/update")
        .header(header::ORIGIN, "https://player.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = relay.app.clone().oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");
}
