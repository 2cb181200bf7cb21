//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, Timestamp, UserId},
    infrastructure::dto::websocket::{ClientEvent, FrameError},
    ui::state::AppState,
    usecase::ConnectionManager,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let origin = headers.get(header::ORIGIN);
    if !state.origin_policy.allows(origin) {
        tracing::warn!("Rejected connection from origin {:?}", origin);
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Create a channel for this connection to receive pushed frames
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let connection_id = match state.manager.on_connect(tx).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Failed to register connection: {}", e);
            let _ = sender.send(Message::Close(None)).await;
            return;
        }
    };

    let manager = state.manager.clone();

    // Spawn a task to receive events from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received frame on '{}': {}", connection_id, text);
                    if let Err(e) = dispatch_event(&manager, connection_id, text.as_str()).await {
                        tracing::warn!("Closing '{}' after {}", connection_id, e);
                        break;
                    }
                }
                Message::Binary(_) => {
                    tracing::warn!("Ignoring binary frame on '{}'", connection_id);
                }
                Message::Ping(_) | Message::Pong(_) => {
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::debug!("Connection '{}' requested close", connection_id);
                    break;
                }
            }
        }
    });

    // Spawn a task to push frames queued for this connection
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.manager.on_disconnect(connection_id).await;
}

/// Decode one text frame and apply it.
///
/// Returns the error only when the frame is not an event envelope at all; the
/// caller then drops the connection. Unknown events and payloads of the wrong
/// shape are logged and skipped.
async fn dispatch_event(
    manager: &ConnectionManager,
    connection_id: ConnectionId,
    frame: &str,
) -> Result<(), FrameError> {
    let event = match ClientEvent::from_frame(frame) {
        Ok(event) => event,
        Err(e) if e.is_malformed() => return Err(e),
        Err(e) => {
            tracing::warn!("Ignoring frame on '{}': {}", connection_id, e);
            return Ok(());
        }
    };

    match event {
        ClientEvent::AddUser(raw_user_id) => {
            let user_id = UserId::from(raw_user_id);
            if let Err(e) = manager.on_announce(connection_id, user_id).await {
                tracing::warn!("Failed to announce on '{}': {}", connection_id, e);
            }
        }
        ClientEvent::SendMessage(payload) => {
            let message = payload.into_relay_message(Timestamp::now());
            manager.on_send_message(message).await;
        }
    }

    Ok(())
}
