//! Caller-facing chat client: connect with bounded reconnection, send
//! actions, receive events through callback hooks.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use huddle_shared::protocol::{ChatMessage, ClientEvent, ErrorNotice, TypingNotice, UserStatus};

use crate::{
    error::ClientError,
    retry::{self, MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY_MILLIS},
    session::{self, SessionEnd},
};

/// Connection parameters supplied by the embedding application.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// WebSocket endpoint, e.g. `ws://127.0.0.1:8080/ws`.
    pub url: String,
    pub auth_token: String,
    pub display_name: String,
}

/// Four independent, optional callback slots. Each is invoked at most once
/// per corresponding server event, in the order received from the transport.
#[derive(Default)]
pub struct Callbacks {
    pub(crate) on_message: Option<Box<dyn Fn(ChatMessage) + Send + Sync>>,
    pub(crate) on_typing: Option<Box<dyn Fn(TypingNotice) + Send + Sync>>,
    pub(crate) on_status_change: Option<Box<dyn Fn(UserStatus) + Send + Sync>>,
    pub(crate) on_error: Option<Box<dyn Fn(ErrorNotice) + Send + Sync>>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_message(mut self, f: impl Fn(ChatMessage) + Send + Sync + 'static) -> Self {
        self.on_message = Some(Box::new(f));
        self
    }

    pub fn on_typing(mut self, f: impl Fn(TypingNotice) + Send + Sync + 'static) -> Self {
        self.on_typing = Some(Box::new(f));
        self
    }

    pub fn on_status_change(mut self, f: impl Fn(UserStatus) + Send + Sync + 'static) -> Self {
        self.on_status_change = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(ErrorNotice) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

/// Commands from the facade to the connection task.
pub(crate) enum Command {
    Send(ClientEvent),
    Disconnect,
}

/// Handle to a running chat connection.
///
/// Actions are fire-and-forget: they queue onto the connection task and are
/// written in order. Dropping the handle (or calling [`disconnect`]) ends the
/// connection; [`wait`] surfaces how it ended.
///
/// [`disconnect`]: ChatClient::disconnect
/// [`wait`]: ChatClient::wait
pub struct ChatClient {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<Result<(), ClientError>>,
}

impl ChatClient {
    /// Spawn the connection task. Reconnects automatically on transport
    /// failure with a fixed delay, up to a bounded number of attempts; after
    /// that the failure is terminal and surfaces through [`ChatClient::wait`].
    pub fn connect(config: ChatConfig, callbacks: Callbacks) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_connection(config, callbacks, command_rx));
        Self { commands, task }
    }

    pub fn join_room(&self, room_id: &str) -> Result<(), ClientError> {
        self.command(ClientEvent::JoinRoom {
            room_id: room_id.to_string(),
        })
    }

    pub fn leave_room(&self, room_id: &str) -> Result<(), ClientError> {
        self.command(ClientEvent::LeaveRoom {
            room_id: room_id.to_string(),
        })
    }

    pub fn send_broadcast(&self, content: &str) -> Result<(), ClientError> {
        self.command(ClientEvent::SendMessage {
            content: content.to_string(),
            room_id: None,
            to_user_id: None,
        })
    }

    pub fn send_to_room(&self, room_id: &str, content: &str) -> Result<(), ClientError> {
        self.command(ClientEvent::SendMessage {
            content: content.to_string(),
            room_id: Some(room_id.to_string()),
            to_user_id: None,
        })
    }

    pub fn send_private(&self, to_user_id: &str, content: &str) -> Result<(), ClientError> {
        self.command(ClientEvent::SendMessage {
            content: content.to_string(),
            room_id: None,
            to_user_id: Some(to_user_id.to_string()),
        })
    }

    pub fn send_typing(&self, room_id: Option<&str>) -> Result<(), ClientError> {
        self.command(ClientEvent::Typing {
            room_id: room_id.map(str::to_string),
        })
    }

    /// Ask the connection task to close the socket and stop reconnecting.
    pub fn disconnect(&self) {
        let _ = self.commands.send(Command::Disconnect);
    }

    /// Wait for the connection task to finish and return how it ended.
    pub async fn wait(self) -> Result<(), ClientError> {
        self.task.await.map_err(|_| ClientError::Closed)?
    }

    fn command(&self, event: ClientEvent) -> Result<(), ClientError> {
        self.commands
            .send(Command::Send(event))
            .map_err(|_| ClientError::Closed)
    }
}

/// Connection loop: Disconnected -> Connecting -> Connected, with a bounded
/// retry counter and a fixed delay between attempts.
async fn run_connection(
    config: ChatConfig,
    callbacks: Callbacks,
    mut commands: mpsc::UnboundedReceiver<Command>,
) -> Result<(), ClientError> {
    let mut attempts_used: u32 = 0;

    loop {
        tracing::info!(
            "connecting to {} as '{}' (attempt {}/{})",
            config.url,
            config.display_name,
            attempts_used + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        let error = match session::run_session(&config, &callbacks, &mut commands).await {
            Ok(SessionEnd::Requested) => {
                tracing::info!("session ended on request");
                return Ok(());
            }
            Err(error) => error,
        };

        // A disconnect requested while no session was up still ends the
        // loop; queued sends have no session to go to and are dropped.
        loop {
            match commands.try_recv() {
                Ok(Command::Disconnect) => return Ok(()),
                Ok(Command::Send(_)) => continue,
                Err(_) => break,
            }
        }

        if retry::is_terminal(&error) {
            tracing::error!("{}", error);
            if let Some(cb) = &callbacks.on_error {
                cb(ErrorNotice {
                    code: "AUTH".to_string(),
                    message: error.to_string(),
                });
            }
            return Err(error);
        }

        tracing::warn!("{}", error);
        if let Some(cb) = &callbacks.on_error {
            cb(ErrorNotice {
                code: "TRANSPORT".to_string(),
                message: error.to_string(),
            });
        }

        attempts_used = retry::next_attempt_count(&error, attempts_used);
        if !retry::should_retry(&error, attempts_used, MAX_RECONNECT_ATTEMPTS) {
            tracing::error!(
                "failed to reconnect after {} attempts, giving up",
                MAX_RECONNECT_ATTEMPTS
            );
            return Err(ClientError::RetriesExhausted(MAX_RECONNECT_ATTEMPTS));
        }

        tracing::info!(
            "reconnecting in {} ms (attempt {}/{})",
            RECONNECT_DELAY_MILLIS,
            attempts_used + 1,
            MAX_RECONNECT_ATTEMPTS
        );
        tokio::time::sleep(Duration::from_millis(RECONNECT_DELAY_MILLIS)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    fn unreachable_config() -> ChatConfig {
        ChatConfig {
            // Loopback port 1 refuses immediately; the paused clock
            // fast-forwards through the fixed retry delays.
            url: "ws://127.0.0.1:1/ws".to_string(),
            auth_token: "t1".to_string(),
            display_name: "Alice".to_string(),
        }
    }

    #[tokio::test]
    async fn unreachable_server_exhausts_the_retry_budget() {
        tokio::time::pause();

        let errors = Arc::new(AtomicU32::new(0));
        let seen = errors.clone();
        let callbacks = Callbacks::new().on_error(move |notice| {
            assert_eq!(notice.code, "TRANSPORT");
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let client = ChatClient::connect(unreachable_config(), callbacks);

        let result = client.wait().await;
        assert!(matches!(result, Err(ClientError::RetriesExhausted(5))));
        // One error surfaced per failed attempt; the give-up itself comes
        // back through wait(), not silently swallowed.
        assert_eq!(errors.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn disconnect_stops_reconnection_attempts() {
        tokio::time::pause();

        let client = ChatClient::connect(unreachable_config(), Callbacks::new());
        client.disconnect();

        assert!(client.wait().await.is_ok());
    }
}
