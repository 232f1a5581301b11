//! HTTP handlers for the authorization flow.

use std::sync::Arc;

use axum::extract::{Json, Query, State};
use axum::response::Redirect;

use crate::application::handlers::CompleteAuthorizationHandler;
use crate::ports::{AuthorizeIntent, CredentialStore, OAuthProvider};

use super::super::error::ApiError;
use super::dto::{CallbackParams, SecretResponse};

/// Dependencies of the authorization endpoints.
#[derive(Clone)]
pub struct AuthorizeAppState {
    pub oauth: Arc<dyn OAuthProvider>,
    pub credentials: Arc<dyn CredentialStore>,
}

impl AuthorizeAppState {
    pub fn complete_handler(&self) -> CompleteAuthorizationHandler {
        CompleteAuthorizationHandler::new(self.oauth.clone(), self.credentials.clone())
    }
}

/// GET / and GET /authorize - Send the browser to the consent page.
pub async fn authorize(State(state): State<AuthorizeAppState>) -> Redirect {
    Redirect::to(&state.oauth.authorize_url(AuthorizeIntent::Link))
}

/// GET /authorize/reset - Consent page for a secret rotation.
pub async fn authorize_reset(State(state): State<AuthorizeAppState>) -> Redirect {
    Redirect::to(&state.oauth.authorize_url(AuthorizeIntent::Reset))
}

/// GET /authorize/callback - Finish the round trip and return the secret.
pub async fn authorize_callback(
    State(state): State<AuthorizeAppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<SecretResponse>, ApiError> {
    let result = state.complete_handler().handle(params.into()).await?;
    Ok(Json(result.into()))
}
