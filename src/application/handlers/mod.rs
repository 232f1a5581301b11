//! Application handlers.
//!
//! Command handlers that orchestrate domain operations across ports.

pub mod authorization;
pub mod handshake;
pub mod status;

pub use authorization::{
    CompleteAuthorizationCommand, CompleteAuthorizationHandler, CompleteAuthorizationResult,
};
pub use handshake::AdmitConnectionHandler;
pub use status::{PublishStatusCommand, PublishStatusHandler, PublishStatusResult};
