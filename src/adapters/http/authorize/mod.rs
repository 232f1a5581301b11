//! HTTP adapter for the browser-facing authorization flow.
//!
//! - `GET /` and `GET /authorize` - Redirect to the platform's consent page
//! - `GET /authorize/reset` - Same, but the callback rotates the secret
//! - `GET /authorize/callback` - Exchange the code and hand out the secret

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{CallbackParams, SecretResponse};
pub use handlers::{authorize, authorize_callback, authorize_reset, AuthorizeAppState};
pub use routes::authorize_routes;
