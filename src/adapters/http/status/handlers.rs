//! HTTP handlers for the ingress endpoint.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;

use crate::application::handlers::{PublishStatusCommand, PublishStatusHandler};
use crate::ports::{ConnectionRegistry, CredentialStore};

use super::super::error::ApiError;
use super::dto::UpdateStatusRequest;

/// Dependencies of the ingress handler.
#[derive(Clone)]
pub struct StatusAppState {
    pub credentials: Arc<dyn CredentialStore>,
    pub registry: Arc<dyn ConnectionRegistry>,
}

impl StatusAppState {
    pub fn publish_handler(&self) -> PublishStatusHandler {
        PublishStatusHandler::new(self.credentials.clone(), self.registry.clone())
    }
}

/// POST /status/update - Publish an update or a clear.
///
/// Takes the raw body so that malformed input maps to `No body` instead of
/// axum's own JSON rejection.
pub async fn update_status(
    State(state): State<StatusAppState>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let request = UpdateStatusRequest::parse(&body)?;
    let command: PublishStatusCommand = request.into();

    let result = state.publish_handler().handle(command).await?;
    tracing::debug!(
        identity = %result.identity,
        kind = result.kind.event_name(),
        delivered = result.delivered,
        "Status published"
    );

    Ok(StatusCode::NO_CONTENT)
}
