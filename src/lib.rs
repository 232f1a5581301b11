//! Presence Relay - real-time status relay.
//!
//! Producers `POST /status/update` with a secret; the relay resolves the
//! secret to an identity and fans the event out to every WebSocket that
//! identity has open. Secrets are minted through an external OAuth
//! platform's consent flow.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
