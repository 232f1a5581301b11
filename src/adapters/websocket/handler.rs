//! WebSocket upgrade handler for status subscribers.
//!
//! Handles the HTTP → WebSocket upgrade and manages the connection lifecycle:
//! 1. Resolve the `secret` query parameter to an identity
//! 2. Refuse the upgrade if it does not resolve
//! 3. Upgrade and attach to the identity's room
//! 4. Drain the connection's queue onto the socket until either side stops
//! 5. Detach exactly once

use std::sync::Arc;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::Deserialize;
use std::fmt;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::adapters::http::{ApiError, ErrorResponse};
use crate::application::AdmitConnectionHandler;
use crate::domain::foundation::{ConnectionId, IdentityId, RelayError};
use crate::domain::status::StatusEvent;
use crate::domain::handshake::Handshake;
use crate::ports::{Attachment, ConnectionHandle, ConnectionRegistry, CredentialStore};

use super::messages::ServerMessage;

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub admit: Arc<AdmitConnectionHandler>,
    pub registry: Arc<dyn ConnectionRegistry>,
    /// Capacity of each connection's outbound queue.
    pub connection_buffer: usize,
}

impl WebSocketState {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        registry: Arc<dyn ConnectionRegistry>,
        connection_buffer: usize,
    ) -> Self {
        Self {
            admit: Arc::new(AdmitConnectionHandler::new(credentials)),
            registry,
            connection_buffer,
        }
    }
}

/// Query parameters of the upgrade request.
#[derive(Debug, Default, Deserialize)]
pub struct SocketParams {
    pub secret: Option<String>,
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /socket?secret=…`
///
/// Authentication happens before the upgrade, so a rejected client gets an
/// ordinary HTTP error and never a socket.
pub async fn ws_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    Query(params): Query<SocketParams>,
    State(state): State<WebSocketState>,
) -> Response {
    let mut handshake = Handshake::begin();

    let identity = match state
        .admit
        .handle(&mut handshake, params.secret.as_deref())
        .await
    {
        Ok(identity) => identity,
        Err(RelayError::InvalidSecret) => {
            tracing::debug!(
                connection_id = %handshake.connection_id(),
                reason = ?handshake.reject_reason(),
                "Handshake rejected"
            );
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(&RelayError::InvalidSecret)),
            )
                .into_response();
        }
        Err(err) => return ApiError::from(err).into_response(),
    };

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(socket, handshake, identity, state))
}

/// Run an authenticated connection until either side stops.
async fn handle_socket(
    socket: WebSocket,
    mut handshake: Handshake,
    identity: IdentityId,
    state: WebSocketState,
) {
    let connection_id = handshake.connection_id();
    let (handle, outbox) = ConnectionHandle::channel(connection_id, state.connection_buffer);

    let attachment = match Attachment::attach(state.registry.clone(), identity.clone(), handle) {
        Ok(attachment) => attachment,
        Err(e) => {
            tracing::warn!(%identity, %connection_id, error = %e, "Attach failed");
            return;
        }
    };
    tracing::info!(%identity, %connection_id, "Connection attached");

    let (sender, receiver) = socket.split();
    pump(sender, receiver, outbox, connection_id).await;

    // Leave the room before tearing the socket down.
    attachment.detach();

    if let Err(e) = handshake.close() {
        tracing::warn!(%connection_id, error = %e, "Handshake close out of order");
    }
    tracing::info!(%identity, %connection_id, "Connection closed");
}

/// Drive one connection until either side stops.
///
/// The writer drains `outbox` onto `sender`; the reader watches `receiver` for
/// the client leaving. Both tasks belong to a `JoinSet` owned by this future,
/// so dropping it (e.g. on shutdown) aborts them too.
async fn pump<S, R, E>(
    mut sender: S,
    mut receiver: R,
    mut outbox: mpsc::Receiver<StatusEvent>,
    connection_id: ConnectionId,
) where
    S: Sink<Message> + Unpin + Send + 'static,
    S::Error: fmt::Display + Send,
    R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: fmt::Display + Send,
{
    let mut tasks = JoinSet::new();

    // Forward queued events to the client
    tasks.spawn(async move {
        while let Some(event) = outbox.recv().await {
            let frame = match ServerMessage::from(event).to_json() {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(%connection_id, error = %e, "Failed to encode frame");
                    continue;
                }
            };
            if let Err(e) = sender.send(Message::Text(frame)).await {
                let err = RelayError::Transport(e.to_string());
                tracing::debug!(%connection_id, error = %err, "Send failed, closing connection");
                break;
            }
        }
    });

    // Watch for the client going away; its messages carry no meaning
    tasks.spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => {
                    tracing::debug!(%connection_id, "Client sent close frame");
                    break;
                }
                Ok(Message::Text(_)) | Ok(Message::Binary(_)) => {
                    tracing::trace!(%connection_id, "Ignoring client message");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Err(e) => {
                    tracing::debug!(%connection_id, error = %e, "Receive error");
                    break;
                }
            }
        }
    });

    // Either side stopping ends the connection
    tasks.join_next().await;
    tasks.abort_all();
}

/// Create axum router for the WebSocket endpoint.
pub fn websocket_router() -> Router<WebSocketState> {
    Router::new().route("/socket", get(ws_handler))
}
