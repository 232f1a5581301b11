//! Connection handshake handlers.

mod admit_connection;

pub use admit_connection::AdmitConnectionHandler;
