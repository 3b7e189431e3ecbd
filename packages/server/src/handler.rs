//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use huddle_shared::protocol::ClientEvent;

use crate::{
    gate::{GateError, Handshake},
    pusher::EventPusher,
    state::AppState,
};

/// Handshake + upgrade. The session gate runs before the upgrade so an
/// incomplete handshake is refused with 401 and never reaches the socket
/// loop.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(handshake): Query<Handshake>,
) -> Result<impl IntoResponse, StatusCode> {
    let identity = match state.gate.admit(&handshake).await {
        Ok(identity) => identity,
        Err(GateError::MissingCredentials) => return Err(StatusCode::UNAUTHORIZED),
    };

    // Channel carrying this connection's outbound events; registered before
    // the upgrade so the connect-time history snapshot has somewhere to go.
    let (tx, rx) = mpsc::unbounded_channel();
    state.pusher.register(identity.id.clone(), tx).await;

    // The identity and channel are already registered; if the client drops
    // before the upgrade completes, `handle_socket` never runs and the
    // teardown has to happen here instead.
    let cleanup_state = state.clone();
    let cleanup_id = identity.id.clone();
    let ws = ws.on_failed_upgrade(move |error| {
        tracing::warn!("upgrade failed for connection '{}': {}", cleanup_id, error);
        tokio::spawn(async move {
            cleanup_state.dispatcher.disconnected(&cleanup_id).await;
        });
    });

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, identity.id, rx)))
}

/// Drains the connection's outbound channel into the WebSocket sink.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connection_id: String,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let (sender, mut receiver) = socket.split();
    let mut push_task = pusher_loop(rx, sender);

    // Announce the newcomer and replay global history.
    state.dispatcher.connected(&connection_id).await;

    let conn = connection_id.clone();
    let state_for_recv = state.clone();

    // Inbound events are handled sequentially, preserving per-connection FIFO
    // order. A malformed frame is dropped; it must never take the dispatcher
    // down.
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("websocket error on '{}': {}", conn, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => state_for_recv.dispatcher.handle_event(&conn, event).await,
                    Err(e) => {
                        tracing::warn!("dropping malformed frame from '{}': {}", conn, e);
                    }
                },
                Message::Close(_) => {
                    tracing::info!("connection '{}' requested close", conn);
                    break;
                }
                Message::Ping(_) => {
                    // Ping/pong is handled by the WebSocket layer itself.
                    tracing::debug!("ping from '{}'", conn);
                }
                _ => {}
            }
        }
    });

    // If either side of the connection finishes, tear down the other.
    tokio::select! {
        _ = &mut recv_task => push_task.abort(),
        _ = &mut push_task => recv_task.abort(),
    };

    state.dispatcher.disconnected(&connection_id).await;
}

/// Health check endpoint.
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}
