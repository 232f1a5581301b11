//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the relay core and the outside world. Adapters implement these ports.
//!
//! - `CredentialStore` - Durable identity ↔ secret bindings
//! - `ConnectionRegistry` - In-process identity rooms and fan-out
//! - `RateLimiter` - Per-origin ingress budget
//! - `OAuthProvider` - External platform that vouches for identities

mod connection_registry;
mod credential_store;
mod oauth_provider;
mod rate_limiter;

pub use connection_registry::{
    Attachment, ConnectionHandle, ConnectionRegistry, ConnectionRegistryError, Delivery,
};
pub use credential_store::{CredentialStore, CredentialStoreError};
pub use oauth_provider::{AuthorizeIntent, OAuthError, OAuthProvider};
pub use rate_limiter::{
    RateLimitDenied, RateLimitError, RateLimitKey, RateLimitResult, RateLimitScope,
    RateLimitStatus, RateLimiter,
};
