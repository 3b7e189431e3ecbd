//! Error types for the Huddle client facade.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server refused the handshake credentials. Terminal: retrying with
    /// the same credentials cannot succeed.
    #[error("authentication rejected by server")]
    Unauthorized,

    /// Dialing the server failed before a session was established.
    #[error("failed to connect: {0}")]
    ConnectFailed(String),

    /// An established session dropped.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// All reconnection attempts were used up.
    #[error("gave up after {0} reconnection attempts")]
    RetriesExhausted(u32),

    /// The connection task is no longer running.
    #[error("client is shut down")]
    Closed,
}
