//! OAuth provider adapters.
//!
//! - `DiscordOAuthProvider` - authorization code flow over HTTPS
//! - `MockOAuthProvider` - in-process fake for tests

mod discord;
mod mock;

pub use discord::DiscordOAuthProvider;
pub use mock::{MockOAuthProvider, MOCK_AUTHORIZE_URL};
