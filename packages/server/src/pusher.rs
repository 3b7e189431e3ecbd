//! Outbound event delivery to connected clients.
//!
//! The WebSocket sender halves live in the transport layer; this module only
//! holds the per-connection mpsc senders and serializes events onto them.
//! Splitting "socket ownership" from "event delivery" keeps the dispatcher
//! free of any transport types.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};

use huddle_shared::protocol::ServerEvent;

/// Channel carrying serialized events to one connection's push task.
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("connection '{0}' is not registered")]
    ConnectionNotFound(String),
    #[error("failed to push event: {0}")]
    PushFailed(String),
}

#[cfg(test)]
use mockall::automock;

/// Delivery seam between the dispatcher and the transport.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EventPusher: Send + Sync {
    async fn register(&self, connection_id: String, sender: PusherChannel);

    async fn unregister(&self, connection_id: &str);

    /// Push one event to one connection. Fails when the connection is gone.
    async fn push_to(&self, connection_id: &str, event: &ServerEvent) -> Result<(), PushError>;

    /// Fan one event out to many connections, best-effort: individual
    /// failures are logged and skipped, never propagated.
    async fn fan_out(&self, targets: &[String], event: &ServerEvent);
}

/// mpsc-channel backed [`EventPusher`] used by the WebSocket transport.
#[derive(Default)]
pub struct ChannelEventPusher {
    connections: Mutex<HashMap<String, PusherChannel>>,
}

impl ChannelEventPusher {
    pub fn new() -> Self {
        Self::default()
    }
}

fn encode(event: &ServerEvent) -> Result<String, PushError> {
    serde_json::to_string(event).map_err(|e| PushError::PushFailed(e.to_string()))
}

#[async_trait]
impl EventPusher for ChannelEventPusher {
    async fn register(&self, connection_id: String, sender: PusherChannel) {
        let mut connections = self.connections.lock().await;
        connections.insert(connection_id.clone(), sender);
        tracing::debug!("connection '{}' registered with pusher", connection_id);
    }

    async fn unregister(&self, connection_id: &str) {
        let mut connections = self.connections.lock().await;
        connections.remove(connection_id);
        tracing::debug!("connection '{}' unregistered from pusher", connection_id);
    }

    async fn push_to(&self, connection_id: &str, event: &ServerEvent) -> Result<(), PushError> {
        let json = encode(event)?;
        let connections = self.connections.lock().await;

        let sender = connections
            .get(connection_id)
            .ok_or_else(|| PushError::ConnectionNotFound(connection_id.to_string()))?;
        sender
            .send(json)
            .map_err(|e| PushError::PushFailed(e.to_string()))
    }

    async fn fan_out(&self, targets: &[String], event: &ServerEvent) {
        let json = match encode(event) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("failed to serialize event for fan-out: {}", e);
                return;
            }
        };

        let connections = self.connections.lock().await;
        for target in targets {
            match connections.get(target) {
                Some(sender) => {
                    if let Err(e) = sender.send(json.clone()) {
                        tracing::warn!("failed to push event to connection '{}': {}", target, e);
                    }
                }
                None => {
                    tracing::warn!("connection '{}' not found during fan-out, skipping", target);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_shared::protocol::ErrorNotice;

    fn test_event() -> ServerEvent {
        ServerEvent::Error(ErrorNotice {
            code: "TEST".to_string(),
            message: "test event".to_string(),
        })
    }

    #[tokio::test]
    async fn push_to_delivers_serialized_event() {
        let pusher = ChannelEventPusher::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        pusher.register("c1".to_string(), tx).await;

        pusher.push_to("c1", &test_event()).await.unwrap();

        let frame = rx.recv().await.unwrap();
        let parsed: ServerEvent = serde_json::from_str(&frame).unwrap();
        assert_eq!(parsed, test_event());
    }

    #[tokio::test]
    async fn push_to_unknown_connection_fails() {
        let pusher = ChannelEventPusher::new();
        let result = pusher.push_to("ghost", &test_event()).await;
        assert!(matches!(result, Err(PushError::ConnectionNotFound(_))));
    }

    #[tokio::test]
    async fn fan_out_reaches_all_targets() {
        let pusher = ChannelEventPusher::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        pusher.register("c1".to_string(), tx1).await;
        pusher.register("c2".to_string(), tx2).await;

        pusher
            .fan_out(&["c1".to_string(), "c2".to_string()], &test_event())
            .await;

        assert!(rx1.recv().await.is_some());
        assert!(rx2.recv().await.is_some());
    }

    #[tokio::test]
    async fn fan_out_skips_missing_connections() {
        let pusher = ChannelEventPusher::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        pusher.register("c1".to_string(), tx).await;

        pusher
            .fan_out(&["ghost".to_string(), "c1".to_string()], &test_event())
            .await;

        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn unregister_stops_delivery() {
        let pusher = ChannelEventPusher::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        pusher.register("c1".to_string(), tx).await;
        pusher.unregister("c1").await;

        let result = pusher.push_to("c1", &test_event()).await;
        assert!(matches!(result, Err(PushError::ConnectionNotFound(_))));
    }
}
