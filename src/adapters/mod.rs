//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the relay core to external systems:
//! - `credentials` - Credential store (PostgreSQL, in-memory)
//! - `rate_limiter` - Sliding-window limiters (Redis, in-memory)
//! - `oauth` - External OAuth platform (Discord, mock)
//! - `websocket` - Identity rooms and socket lifecycle
//! - `http` - REST endpoints, middleware and router

pub mod credentials;
pub mod http;
pub mod oauth;
pub mod rate_limiter;
pub mod websocket;
