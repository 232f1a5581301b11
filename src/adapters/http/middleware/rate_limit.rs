//! Rate limiting middleware for the ingress route.
//!
//! Checks two scopes in order, before the request reaches its handler:
//! 1. Global rate limit (infrastructure protection)
//! 2. Per-origin rate limit for the guarded resource
//!
//! A denied request never touches the credential store or the registry.
//!
//! Rate limit status is returned in standard HTTP headers:
//! - `X-RateLimit-Limit`: Maximum requests allowed in the window
//! - `X-RateLimit-Remaining`: Requests remaining in the current window
//! - `X-RateLimit-Reset`: Unix timestamp when the oldest request leaves the window
//! - `Retry-After`: Seconds to wait (only on 429 response)
//!
//! # Example
//!
//! ```ignore
//! let limit = IngressRateLimit::new(limiter, "status_update", true);
//! let app = Router::new()
//!     .route("/status/update", post(handler))
//!     .route_layer(middleware::from_fn_with_state(limit, rate_limit_middleware));
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::domain::foundation::RelayError;
use crate::ports::{RateLimitDenied, RateLimitKey, RateLimitResult, RateLimitStatus, RateLimiter};

use super::super::error::ApiError;

/// Standard rate limit header names.
pub mod headers {
    use super::HeaderName;

    pub static X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
    pub static X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
    pub static X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");
}

/// Middleware state: which limiter, for which resource.
#[derive(Clone)]
pub struct IngressRateLimit {
    limiter: Arc<dyn RateLimiter>,
    resource: &'static str,
    trust_proxy_headers: bool,
}

impl IngressRateLimit {
    pub fn new(
        limiter: Arc<dyn RateLimiter>,
        resource: &'static str,
        trust_proxy_headers: bool,
    ) -> Self {
        Self {
            limiter,
            resource,
            trust_proxy_headers,
        }
    }
}

/// Rate limiting middleware.
///
/// Limiter backend failures fail open: the request proceeds and a warning is
/// logged.
pub async fn rate_limit_middleware(
    State(limit): State<IngressRateLimit>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Response {
    let client_ip = extract_client_ip(
        request.headers(),
        connect_info.as_ref(),
        limit.trust_proxy_headers,
    );

    match limit.limiter.check(RateLimitKey::global()).await {
        Ok(RateLimitResult::Denied(denied)) => return rate_limit_response(&denied),
        Ok(RateLimitResult::Allowed(_)) => {}
        Err(e) => tracing::warn!(error = %e, "Rate limiter unavailable for global check"),
    }

    let mut origin_status = None;
    match &client_ip {
        Some(ip) => {
            let key = RateLimitKey::ip_resource(ip, limit.resource);
            match limit.limiter.check(key).await {
                Ok(RateLimitResult::Denied(denied)) => {
                    tracing::debug!(client_ip = %ip, resource = limit.resource, "Rate limited");
                    return rate_limit_response(&denied);
                }
                Ok(RateLimitResult::Allowed(status)) => origin_status = Some(status),
                Err(e) => {
                    tracing::warn!(client_ip = %ip, error = %e, "Rate limiter unavailable for origin check");
                }
            }
        }
        None => tracing::debug!("No client origin available, skipping per-origin limit"),
    }

    let mut response = next.run(request).await;
    if let Some(status) = origin_status {
        add_rate_limit_headers(response.headers_mut(), &status);
    }
    response
}

/// Extract client IP from request, checking forwarded headers first.
///
/// Order of precedence:
/// 1. X-Forwarded-For header (first IP in list)
/// 2. X-Real-IP header
/// 3. ConnectInfo socket address
///
/// Headers are ignored unless `trust_proxy_headers` is set.
pub fn extract_client_ip(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
    trust_proxy_headers: bool,
) -> Option<String> {
    if trust_proxy_headers {
        let forwarded = headers
            .get("X-Forwarded-For")
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = forwarded {
            return Some(ip.to_string());
        }

        let real_ip = headers
            .get("X-Real-IP")
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = real_ip {
            return Some(ip.to_string());
        }
    }

    connect_info.map(|ci| ci.0.ip().to_string())
}

/// 429 with `Retry-After` and the limit headers.
fn rate_limit_response(denied: &RateLimitDenied) -> Response {
    let mut response = ApiError(RelayError::RateLimited {
        retry_after_secs: denied.retry_after_secs(),
    })
    .into_response();

    let headers = response.headers_mut();
    headers.insert(headers::X_RATELIMIT_LIMIT.clone(), HeaderValue::from(denied.limit));
    headers.insert(headers::X_RATELIMIT_REMAINING.clone(), HeaderValue::from(0u32));
    response
}

fn add_rate_limit_headers(headers: &mut HeaderMap, status: &RateLimitStatus) {
    headers.insert(headers::X_RATELIMIT_LIMIT.clone(), HeaderValue::from(status.limit));
    headers.insert(
        headers::X_RATELIMIT_REMAINING.clone(),
        HeaderValue::from(status.remaining),
    );
    headers.insert(
        headers::X_RATELIMIT_RESET.clone(),
        HeaderValue::from(status.reset_at.as_unix_secs()),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::rate_limiter::{InMemoryRateLimiter, RateLimitConfig};
    use crate::ports::RateLimitError;
    use async_trait::async_trait;
    use axum::{body::Body, http::StatusCode, middleware, routing::post, Router};
    use std::net::{IpAddr, Ipv4Addr};
    use tower::ServiceExt;

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(
                HeaderName::from_bytes(k.as_bytes()).unwrap(),
                HeaderValue::from_str(v).unwrap(),
            );
        }
        map
    }

    fn peer() -> ConnectInfo<SocketAddr> {
        ConnectInfo(SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 9)), 4000))
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Origin Extraction Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn takes_first_forwarded_hop() {
        let map = headers(&[("X-Forwarded-For", "1.2.3.4, 5.6.7.8")]);
        assert_eq!(extract_client_ip(&map, None, true), Some("1.2.3.4".into()));
    }

    #[test]
    fn falls_back_to_real_ip() {
        let map = headers(&[("X-Real-IP", "9.8.7.6")]);
        assert_eq!(extract_client_ip(&map, None, true), Some("9.8.7.6".into()));
    }

    #[test]
    fn falls_back_to_peer_address() {
        let info = peer();
        assert_eq!(
            extract_client_ip(&HeaderMap::new(), Some(&info), true),
            Some("10.0.0.9".into())
        );
    }

    #[test]
    fn untrusted_headers_are_ignored() {
        let map = headers(&[("X-Forwarded-For", "1.2.3.4")]);
        let info = peer();
        assert_eq!(
            extract_client_ip(&map, Some(&info), false),
            Some("10.0.0.9".into())
        );
    }

    #[test]
    fn no_origin_at_all() {
        assert_eq!(extract_client_ip(&HeaderMap::new(), None, true), None);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Middleware Tests
    // ════════════════════════════════════════════════════════════════════════════

    fn app(limiter: Arc<dyn RateLimiter>) -> Router {
        let limit = IngressRateLimit::new(limiter, "status_update", true);
        Router::new()
            .route("/status/update", post(|| async { StatusCode::NO_CONTENT }))
            .route_layer(middleware::from_fn_with_state(limit, rate_limit_middleware))
    }

    fn request(ip: &str) -> Request {
        axum::http::Request::post("/status/update")
            .header("X-Forwarded-For", ip)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn third_request_in_window_gets_429() {
        let app = app(Arc::new(InMemoryRateLimiter::new(RateLimitConfig::per_ip(2, 1_000))));

        let first = app.clone().oneshot(request("1.1.1.1")).await.unwrap();
        let second = app.clone().oneshot(request("1.1.1.1")).await.unwrap();
        let third = app.clone().oneshot(request("1.1.1.1")).await.unwrap();

        assert_eq!(first.status(), StatusCode::NO_CONTENT);
        assert_eq!(first.headers()[&headers::X_RATELIMIT_REMAINING], "1");
        assert_eq!(second.status(), StatusCode::NO_CONTENT);
        assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(third.headers().contains_key("retry-after"));
        assert_eq!(third.headers()[&headers::X_RATELIMIT_LIMIT], "2");
    }

    #[tokio::test]
    async fn other_origins_are_unaffected() {
        let app = app(Arc::new(InMemoryRateLimiter::new(RateLimitConfig::per_ip(1, 1_000))));

        app.clone().oneshot(request("1.1.1.1")).await.unwrap();
        let other = app.oneshot(request("2.2.2.2")).await.unwrap();

        assert_eq!(other.status(), StatusCode::NO_CONTENT);
    }

    struct BrokenLimiter;

    #[async_trait]
    impl RateLimiter for BrokenLimiter {
        async fn check(&self, _: RateLimitKey) -> Result<RateLimitResult, RateLimitError> {
            Err(RateLimitError::Unavailable("connection refused".into()))
        }

        async fn status(&self, _: RateLimitKey) -> Result<RateLimitStatus, RateLimitError> {
            Err(RateLimitError::Unavailable("connection refused".into()))
        }

        async fn reset(&self, _: RateLimitKey) -> Result<(), RateLimitError> {
            Err(RateLimitError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn limiter_outage_fails_open() {
        let app = app(Arc::new(BrokenLimiter));

        for _ in 0..5 {
            let response = app.clone().oneshot(request("1.1.1.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::NO_CONTENT);
        }
    }
}
