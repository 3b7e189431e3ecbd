//! Session gate: authenticates a connecting client before admission.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use huddle_shared::{protocol::UserStatus, time::Clock};

use crate::registry::ConnectionRegistry;

/// Handshake data supplied by the client at connect time.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GateError {
    #[error("authentication error: missing credentials")]
    MissingCredentials,
}

/// Admits connections whose handshake carries both credential fields.
///
/// The token is treated as opaque: no cryptographic validation happens here.
/// A real validator must keep the contract of rejecting incomplete handshakes
/// and constructing the identity atomically with registration.
pub struct SessionGate {
    registry: Arc<Mutex<ConnectionRegistry>>,
    clock: Arc<dyn Clock>,
}

impl SessionGate {
    pub fn new(registry: Arc<Mutex<ConnectionRegistry>>, clock: Arc<dyn Clock>) -> Self {
        Self { registry, clock }
    }

    /// Validate the handshake, mint a fresh identity, and register it.
    ///
    /// Returns the admitted identity; its `id` doubles as the connection id
    /// for the lifetime of this physical connection. On failure no state is
    /// mutated.
    pub async fn admit(&self, handshake: &Handshake) -> Result<UserStatus, GateError> {
        let _token = non_empty(handshake.auth_token.as_deref()).ok_or_else(|| {
            tracing::warn!("rejecting connection: missing auth token");
            GateError::MissingCredentials
        })?;
        let display_name = non_empty(handshake.display_name.as_deref()).ok_or_else(|| {
            tracing::warn!("rejecting connection: missing display name");
            GateError::MissingCredentials
        })?;

        let identity = UserStatus {
            id: Uuid::new_v4().to_string(),
            display_name: display_name.to_string(),
            is_online: true,
            last_seen: self.clock.now_millis(),
        };

        let mut registry = self.registry.lock().await;
        registry.register(identity.id.clone(), identity.clone());
        tracing::info!(
            "admitted '{}' as connection '{}'",
            identity.display_name,
            identity.id
        );

        Ok(identity)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
