//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers and error types that form the
//! vocabulary of the relay.

mod errors;
mod ids;
mod secret;
mod state_machine;
mod timestamp;

pub use errors::{ErrorCode, RelayError, ValidationError};
pub use ids::{ConnectionId, IdentityId};
pub use secret::{AccessToken, ClientSecret, SECRET_BYTES};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
