//! OAuth configuration
//!
//! Defaults point at Discord; any platform with an authorization code flow
//! and a "who am I" endpoint returning `{ "id": … }` can be configured.

use secrecy::SecretString;
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

/// OAuth client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthConfig {
    /// Application (client) id registered with the platform
    pub client_id: String,

    /// Client secret; never logged
    pub client_secret: SecretString,

    /// Public URL of `/authorize/callback`, as registered with the platform
    pub callback_uri: String,

    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,

    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Endpoint returning the token owner's `id`
    #[serde(default = "default_identity_url")]
    pub identity_url: String,

    #[serde(default = "default_scope")]
    pub scope: String,

    /// Timeout for calls to the platform, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl OAuthConfig {
    /// Validate OAuth configuration
    pub fn validate(&self, environment: Environment) -> Result<(), ValidationError> {
        if self.client_id.is_empty() {
            return Err(ValidationError::MissingRequired("OAUTH__CLIENT_ID"));
        }
        if self.callback_uri.is_empty() {
            return Err(ValidationError::MissingRequired("OAUTH__CALLBACK_URI"));
        }

        for (name, url) in [
            ("callback_uri", &self.callback_uri),
            ("authorize_url", &self.authorize_url),
            ("token_url", &self.token_url),
            ("identity_url", &self.identity_url),
        ] {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                return Err(ValidationError::InvalidOAuthUrl(name));
            }
        }

        if environment == Environment::Production && !self.callback_uri.starts_with("https://") {
            return Err(ValidationError::CallbackMustBeHttps);
        }
        Ok(())
    }
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: SecretString::new(String::new()),
            callback_uri: String::new(),
            authorize_url: default_authorize_url(),
            token_url: default_token_url(),
            identity_url: default_identity_url(),
            scope: default_scope(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_authorize_url() -> String {
    "https://discord.com/oauth2/authorize".to_string()
}

fn default_token_url() -> String {
    "https://discord.com/api/oauth2/token".to_string()
}

fn default_identity_url() -> String {
    "https://discord.com/api/users/@me".to_string()
}

fn default_scope() -> String {
    "identify".to_string()
}

fn default_request_timeout() -> u64 {
    10
}
