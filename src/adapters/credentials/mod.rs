//! Credential store adapters.
//!
//! - `PostgresCredentialStore` - durable, migration-managed
//! - `InMemoryCredentialStore` - tests and local development

mod in_memory;
mod postgres;

pub use in_memory::InMemoryCredentialStore;
pub use postgres::PostgresCredentialStore;
