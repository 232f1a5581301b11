//! Domain layer containing relay types and lifecycle rules.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (identifiers, secrets, errors, state machine)
//! - `credential` - Identity ↔ secret binding
//! - `status` - `update`/`clear` events relayed to clients
//! - `handshake` - Connection attempt lifecycle (`Pending → Authenticated/Rejected → Closed`)

pub mod credential;
pub mod foundation;
pub mod handshake;
pub mod status;
