//! Discord OAuth2 adapter.
//!
//! Implements the `OAuthProvider` port against Discord's authorization code
//! flow:
//!
//! 1. Redirect the browser to the consent page (`authorize_url`)
//! 2. Exchange the returned code at the token endpoint
//! 3. Fetch `/users/@me` with the access token; its `id` is the identity
//!
//! Endpoints are configurable, so any provider with the same shape works.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use secrecy::ExposeSecret;
use serde::Deserialize;

use crate::config::OAuthConfig;
use crate::domain::foundation::{AccessToken, IdentityId};
use crate::ports::{AuthorizeIntent, OAuthError, OAuthProvider};

/// Token endpoint response (only the fields we use).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Identity endpoint response.
#[derive(Debug, Deserialize)]
struct IdentityResponse {
    id: String,
}

/// OAuth provider talking to Discord (or a compatible platform).
pub struct DiscordOAuthProvider {
    client: Client,
    config: OAuthConfig,
    authorize_endpoint: Url,
}

impl DiscordOAuthProvider {
    pub fn new(config: OAuthConfig) -> Result<Self, OAuthError> {
        let authorize_endpoint = Url::parse(&config.authorize_url).map_err(|e| {
            OAuthError::InvalidResponse(format!("invalid authorize URL: {}", e))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| OAuthError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            config,
            authorize_endpoint,
        })
    }
}

fn transport(err: reqwest::Error) -> OAuthError {
    OAuthError::Unavailable(err.to_string())
}

fn check_status(status: StatusCode) -> Result<(), OAuthError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(OAuthError::Rejected {
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl OAuthProvider for DiscordOAuthProvider {
    fn authorize_url(&self, intent: AuthorizeIntent) -> String {
        let mut url = self.authorize_endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.config.client_id)
                .append_pair("redirect_uri", &self.config.callback_uri)
                .append_pair("response_type", "code")
                .append_pair("scope", &self.config.scope);
            if let Some(state) = intent.state() {
                query.append_pair("state", state);
            }
        }
        url.into()
    }

    async fn exchange_code(&self, code: &str) -> Result<AccessToken, OAuthError> {
        let form = [
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret().as_str()),
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.callback_uri.as_str()),
        ];

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(transport)?;

        if let Err(err) = check_status(response.status()) {
            tracing::warn!(error = %err, "Token exchange rejected");
            return Err(err);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::InvalidResponse(e.to_string()))?;

        Ok(AccessToken::new(token.access_token))
    }

    async fn fetch_identity(&self, token: &AccessToken) -> Result<IdentityId, OAuthError> {
        let response = self
            .client
            .get(&self.config.identity_url)
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(transport)?;

        check_status(response.status())?;

        let body: IdentityResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::InvalidResponse(e.to_string()))?;

        IdentityId::new(body.id).map_err(|e| OAuthError::InvalidResponse(e.to_string()))
    }
}

impl std::fmt::Debug for DiscordOAuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordOAuthProvider")
            .field("authorize_endpoint", &self.authorize_endpoint.as_str())
            .field("client_id", &self.config.client_id)
            .finish_non_exhaustive()
    }
}
