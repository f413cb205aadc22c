//! Presence channel WebSocket upgrade handler.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::Response;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{info, warn};

use deepsearch_core::error::AppError;
use deepsearch_realtime::connection::authenticator::{AuthenticatedConnection, WsAuthenticator};
use deepsearch_realtime::connection::handle::WireFrame;
use deepsearch_realtime::connection::heartbeat::{HeartbeatConfig, run_heartbeat};

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters accepted by the upgrade endpoint.
///
/// Browser tabs cannot set WebSocket headers, so the credential may arrive
/// as a query parameter instead of an Authorization header.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Bearer access token.
    pub token: Option<String>,
}

/// GET /ws — presence channel upgrade.
///
/// The credential is authenticated before the protocol switch; a bad token
/// never gets a socket.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    Query(query): Query<WsQuery>,
) -> Result<Response, ApiError> {
    let header_token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(String::from);

    let token = header_token
        .or(query.token)
        .ok_or_else(|| AppError::authentication("Missing presence credential"))?;

    let authenticator = WsAuthenticator::new(state.jwt_decoder.clone());
    let auth = authenticator.authenticate(&token)?;

    Ok(ws.on_upgrade(move |socket| handle_socket(state, auth, socket)))
}

/// Drives one established presence connection.
async fn handle_socket(state: AppState, auth: AuthenticatedConnection, socket: WebSocket) {
    let (handle, mut outbound_rx) = state
        .presence
        .connections
        .register(auth.user_id.clone(), auth.username.clone());
    let conn_id = handle.id;

    info!(
        conn_id = %conn_id,
        user_id = %auth.user_id,
        "Presence connection established"
    );

    let heartbeat = tokio::spawn(run_heartbeat(
        handle.clone(),
        HeartbeatConfig::from(&state.presence.config),
    ));

    let (mut ws_tx, mut ws_rx) = socket.split();

    // Forward queued frames to the socket.
    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            let message = match frame {
                WireFrame::Event(text) => Message::Text(text.into()),
                WireFrame::Ping => Message::Ping(Bytes::new()),
            };
            if ws_tx.send(message).await.is_err() {
                break;
            }
        }
    });

    // Read until the peer goes away or the heartbeat declares it dead.
    loop {
        tokio::select! {
            _ = handle.wait_closed() => break,
            inbound = ws_rx.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    state
                        .presence
                        .connections
                        .handle_inbound(&conn_id, text.as_str())
                        .await;
                }
                Some(Ok(Message::Pong(_))) => handle.touch(),
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "Presence socket error");
                    break;
                }
            },
        }
    }

    writer.abort();
    heartbeat.abort();
    state.presence.connections.unregister(&conn_id).await;

    info!(
        conn_id = %conn_id,
        user_id = %auth.user_id,
        "Presence connection closed"
    );
}
