//! HTTP middleware for axum.
//!
//! - `rate_limit` - Per-origin ingress rate limiting

pub mod rate_limit;

pub use rate_limit::{extract_client_ip, rate_limit_middleware, IngressRateLimit};
