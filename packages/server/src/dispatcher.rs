//! Protocol state machine: validates inbound events, consults the rate
//! limiter, appends to history, and fans out to the right recipient set.

use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use huddle_shared::{
    protocol::{ChatMessage, ClientEvent, ErrorNotice, Scope, ServerEvent, TypingNotice},
    time::Clock,
};

use crate::{
    history::HistoryBuffer,
    pusher::EventPusher,
    rate_limit::RateLimiter,
    registry::ConnectionRegistry,
};

/// Handles every post-admission event of a connection's lifetime.
///
/// The dispatcher is the single writer of the registry, history, and limiter;
/// the transport layer only feeds it events in per-connection FIFO order.
/// Errors local to one connection's action never reach other connections, and
/// malformed events are dropped rather than propagated.
pub struct Dispatcher {
    registry: Arc<Mutex<ConnectionRegistry>>,
    history: Arc<Mutex<HistoryBuffer>>,
    limiter: Arc<Mutex<RateLimiter>>,
    pusher: Arc<dyn EventPusher>,
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<Mutex<ConnectionRegistry>>,
        history: Arc<Mutex<HistoryBuffer>>,
        limiter: Arc<Mutex<RateLimiter>>,
        pusher: Arc<dyn EventPusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            history,
            limiter,
            pusher,
            clock,
        }
    }

    /// Post-admission setup: announce the newcomer to everyone else and send
    /// it the global history snapshot.
    pub async fn connected(&self, connection_id: &str) {
        let (identity, others) = {
            let registry = self.registry.lock().await;
            let Some(identity) = registry.identity(connection_id).cloned() else {
                tracing::warn!("connected fired for unknown connection '{}'", connection_id);
                return;
            };
            (identity, registry.connections_except(connection_id))
        };

        self.pusher
            .fan_out(&others, &ServerEvent::UserStatus(identity))
            .await;

        let snapshot = self.history.lock().await.global_history();
        if let Err(e) = self
            .pusher
            .push_to(connection_id, &ServerEvent::History(snapshot))
            .await
        {
            tracing::warn!("failed to send history to '{}': {}", connection_id, e);
        }
    }

    /// Handle one inbound event from an authenticated connection.
    pub async fn handle_event(&self, connection_id: &str, event: ClientEvent) {
        match event {
            ClientEvent::JoinRoom { room_id } => self.join_room(connection_id, &room_id).await,
            ClientEvent::LeaveRoom { room_id } => {
                self.registry.lock().await.leave_room(&room_id, connection_id);
                tracing::debug!("'{}' left room '{}'", connection_id, room_id);
            }
            ClientEvent::Typing { room_id } => self.typing(connection_id, room_id).await,
            ClientEvent::SendMessage {
                content,
                room_id,
                to_user_id,
            } => {
                self.send_message(connection_id, content, room_id, to_user_id)
                    .await
            }
        }
    }

    /// Teardown after the transport closes: unregister everywhere and
    /// announce the offline status to the remaining connections.
    pub async fn disconnected(&self, connection_id: &str) {
        let now = self.clock.now_millis();
        let departed = self.registry.lock().await.unregister(connection_id, now);
        self.limiter.lock().await.forget(connection_id);
        self.pusher.unregister(connection_id).await;

        let Some(identity) = departed else {
            return;
        };
        tracing::info!(
            "connection '{}' ('{}') disconnected",
            connection_id,
            identity.display_name
        );

        let remaining = self.registry.lock().await.all_connections();
        self.pusher
            .fan_out(&remaining, &ServerEvent::UserStatus(identity))
            .await;
    }

    /// Any authenticated connection may join any room; the joiner gets that
    /// room's history snapshot.
    async fn join_room(&self, connection_id: &str, room_id: &str) {
        self.registry.lock().await.join_room(room_id, connection_id);
        tracing::debug!("'{}' joined room '{}'", connection_id, room_id);

        let snapshot = self.history.lock().await.room_history(room_id);
        if let Err(e) = self
            .pusher
            .push_to(connection_id, &ServerEvent::History(snapshot))
            .await
        {
            tracing::warn!(
                "failed to send room history to '{}': {}",
                connection_id,
                e
            );
        }
    }

    /// Fire-and-forget typing indicator. Never rate-limited, never stored.
    async fn typing(&self, connection_id: &str, room_id: Option<String>) {
        let (identity, targets) = {
            let registry = self.registry.lock().await;
            let Some(identity) = registry.identity(connection_id).cloned() else {
                return;
            };
            let targets = match room_id.as_deref() {
                Some(room) => registry.room_members_except(room, connection_id),
                None => registry.connections_except(connection_id),
            };
            (identity, targets)
        };

        let notice = TypingNotice {
            user_id: identity.id,
            display_name: identity.display_name,
            room_id,
        };
        self.pusher
            .fan_out(&targets, &ServerEvent::Typing(notice))
            .await;
    }

    async fn send_message(
        &self,
        connection_id: &str,
        content: String,
        room_id: Option<String>,
        to_user_id: Option<String>,
    ) {
        // A message belongs to exactly one scope. Both set is a contract
        // violation; only the rate-limit error has a wire shape, so the
        // event is dropped without a reply.
        if room_id.is_some() && to_user_id.is_some() {
            tracing::warn!(
                "dropping message from '{}': both roomId and toUserId set",
                connection_id
            );
            return;
        }

        let now = self.clock.now_millis();
        if self.limiter.lock().await.is_limited(connection_id, now) {
            tracing::debug!("rate limited connection '{}'", connection_id);
            if let Err(e) = self
                .pusher
                .push_to(connection_id, &ServerEvent::Error(ErrorNotice::rate_limit()))
                .await
            {
                tracing::warn!("failed to send rate-limit error to '{}': {}", connection_id, e);
            }
            return;
        }

        let Some(identity) = self.registry.lock().await.identity(connection_id).cloned() else {
            tracing::warn!(
                "dropping message from unregistered connection '{}'",
                connection_id
            );
            return;
        };

        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            sender_id: identity.id,
            sender_name: identity.display_name,
            content,
            timestamp: now,
            room_id,
            to_user_id,
        };
        self.history.lock().await.append(message.clone());

        let event = ServerEvent::Message(message.clone());
        match message.scope() {
            Scope::Private(user_id) => {
                let targets = self.registry.lock().await.connections_for_user(user_id);
                self.pusher.fan_out(&targets, &event).await;
                // Echo so the sender sees their own private message rendered.
                if let Err(e) = self.pusher.push_to(connection_id, &event).await {
                    tracing::warn!("failed to echo private message to '{}': {}", connection_id, e);
                }
            }
            Scope::Room(room) => {
                // Sender is a room member, so it is included in the fan-out.
                let targets = self.registry.lock().await.room_members(room);
                self.pusher.fan_out(&targets, &event).await;
            }
            Scope::Global => {
                let targets = self.registry.lock().await.all_connections();
                self.pusher.fan_out(&targets, &event).await;
            }
        }
    }
}
