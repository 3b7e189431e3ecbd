//! One WebSocket session: reads server events into callbacks, writes queued
//! actions to the socket.

use futures_util::{SinkExt, StreamExt};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, protocol::Message},
};

use huddle_shared::protocol::ServerEvent;

use crate::{
    error::ClientError,
    facade::{Callbacks, ChatConfig, Command},
};

/// How a session ended when it did not fail.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum SessionEnd {
    /// The caller asked to disconnect.
    Requested,
}

/// Run a single session against the server.
///
/// Returns `Ok(SessionEnd::Requested)` on caller-initiated disconnect,
/// `Err(Unauthorized)` when the handshake is refused, `Err(ConnectFailed)`
/// when dialing fails, and `Err(ConnectionLost)` when an established session
/// drops.
/// Credentials travel as query parameters; both values are percent-encoded
/// so display names with spaces, `&`, or non-ASCII stay valid in the URI.
pub(crate) fn handshake_url(config: &ChatConfig) -> String {
    format!(
        "{}?authToken={}&displayName={}",
        config.url,
        utf8_percent_encode(&config.auth_token, NON_ALPHANUMERIC),
        utf8_percent_encode(&config.display_name, NON_ALPHANUMERIC),
    )
}

pub(crate) async fn run_session(
    config: &ChatConfig,
    callbacks: &Callbacks,
    commands: &mut mpsc::UnboundedReceiver<Command>,
) -> Result<SessionEnd, ClientError> {
    let url = handshake_url(config);

    let (ws_stream, _response) = match connect_async(&url).await {
        Ok(result) => result,
        Err(tungstenite::Error::Http(response))
            if response.status() == tungstenite::http::StatusCode::UNAUTHORIZED =>
        {
            return Err(ClientError::Unauthorized);
        }
        Err(e) => return Err(ClientError::ConnectFailed(e.to_string())),
    };

    tracing::info!("connected to chat server as '{}'", config.display_name);
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => dispatch_frame(&text, callbacks),
                Some(Ok(Message::Close(_))) => {
                    tracing::info!("server closed the connection");
                    return Err(ClientError::ConnectionLost("server closed".to_string()));
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(ClientError::ConnectionLost(e.to_string())),
                None => return Err(ClientError::ConnectionLost("stream ended".to_string())),
            },
            command = commands.recv() => match command {
                Some(Command::Send(event)) => {
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::error!("failed to serialize event: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = write.send(Message::Text(json.into())).await {
                        return Err(ClientError::ConnectionLost(e.to_string()));
                    }
                }
                Some(Command::Disconnect) | None => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(SessionEnd::Requested);
                }
            },
        }
    }
}

/// Route one server frame to the matching callback slot. Frames that do not
/// parse are dropped with a warning; a `history` frame replays each contained
/// message through `on_message`.
pub(crate) fn dispatch_frame(text: &str, callbacks: &Callbacks) {
    let event = match serde_json::from_str::<ServerEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("dropping unparseable server frame: {}", e);
            return;
        }
    };

    match event {
        ServerEvent::Message(message) => {
            if let Some(cb) = &callbacks.on_message {
                cb(message);
            }
        }
        ServerEvent::History(messages) => {
            if let Some(cb) = &callbacks.on_message {
                for message in messages {
                    cb(message);
                }
            }
        }
        ServerEvent::Typing(notice) => {
            if let Some(cb) = &callbacks.on_typing {
                cb(notice);
            }
        }
        ServerEvent::UserStatus(status) => {
            if let Some(cb) = &callbacks.on_status_change {
                cb(status);
            }
        }
        ServerEvent::Error(notice) => {
            if let Some(cb) = &callbacks.on_error {
                cb(notice);
            }
        }
    }
}
