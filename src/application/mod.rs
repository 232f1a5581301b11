//! Application layer - Commands and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Handlers own no state of their own; the stores and registry they use are
//! injected, so each test builds independent instances.

pub mod handlers;

pub use handlers::{
    AdmitConnectionHandler, CompleteAuthorizationCommand, CompleteAuthorizationHandler,
    CompleteAuthorizationResult, PublishStatusCommand, PublishStatusHandler, PublishStatusResult,
};
