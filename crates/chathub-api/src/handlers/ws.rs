//! WebSocket upgrade handler.
//!
//! The bearer token travels in the `Sec-WebSocket-Protocol` header, since
//! browsers cannot set `Authorization` on a WebSocket handshake. A `token`
//! query parameter is accepted as a fallback for non-browser clients.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::http::header::SEC_WEBSOCKET_PROTOCOL;
use axum::response::Response;
use futures::{SinkExt, StreamExt, future};
use tracing::{error, info};

use chathub_auth::AuthenticatedConnection;
use chathub_core::error::AppError;
use chathub_realtime::Frame;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters accepted at upgrade.
#[derive(Debug, Default, serde::Deserialize)]
pub struct WsQuery {
    /// JWT, when not offered as a subprotocol.
    pub token: Option<String>,
}

/// Where the token was found.
enum TokenSource {
    Protocol(String),
    Query(String),
}

/// GET /ws — authenticate, then upgrade
pub async fn ws_upgrade(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let source = extract_token(&headers, query)
        .ok_or_else(|| AppError::authentication("Missing bearer token"))?;

    let token = match &source {
        TokenSource::Protocol(token) | TokenSource::Query(token) => token,
    };
    let auth = state.authenticator.authenticate(token)?;

    let max_frame = state.config.realtime.max_frame_bytes;
    let mut ws = ws.max_message_size(max_frame).max_frame_size(max_frame);
    // the client only accepts the handshake if the offered protocol is echoed
    if let TokenSource::Protocol(token) = source {
        ws = ws.protocols([token]);
    }

    Ok(ws.on_upgrade(move |socket| handle_ws_connection(state, auth, socket)))
}

fn extract_token(headers: &HeaderMap, query: WsQuery) -> Option<TokenSource> {
    let offered = headers
        .get(SEC_WEBSOCKET_PROTOCOL)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').map(str::trim).find(|p| !p.is_empty()));

    if let Some(token) = offered {
        return Some(TokenSource::Protocol(token.to_string()));
    }

    query
        .token
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .map(TokenSource::Query)
}

/// Runs an established WebSocket connection until its agent stops.
async fn handle_ws_connection(state: AppState, auth: AuthenticatedConnection, socket: WebSocket) {
    let (ws_tx, ws_rx) = socket.split();

    let stream = ws_rx.map(|result| result.map(frame_from_message));
    let sink = ws_tx.with(|frame: Frame| future::ready(Ok::<_, axum::Error>(message_from_frame(frame))));

    let (handle, task) = state
        .realtime
        .connections
        .accept(auth.username, sink, stream);

    info!(conn_id = %handle.id, username = %handle.username, "WebSocket connection established");

    if let Err(e) = task.await {
        error!(conn_id = %handle.id, error = %e, "WebSocket connection task failed");
    }
}

fn frame_from_message(message: Message) -> Frame {
    match message {
        Message::Text(text) => Frame::Text(text.as_str().to_string()),
        Message::Binary(bytes) => Frame::Binary(bytes),
        Message::Ping(bytes) => Frame::Ping(bytes),
        Message::Pong(bytes) => Frame::Pong(bytes),
        Message::Close(_) => Frame::Close,
    }
}

fn message_from_frame(frame: Frame) -> Message {
    match frame {
        Frame::Text(text) => Message::Text(text.into()),
        Frame::Binary(bytes) => Message::Binary(bytes),
        Frame::Ping(bytes) => Message::Ping(bytes),
        Frame::Pong(bytes) => Message::Pong(bytes),
        Frame::Close => Message::Close(None),
    }
}
