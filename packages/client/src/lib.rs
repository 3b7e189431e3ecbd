//! Huddle chat client.
//!
//! [`facade::ChatClient`] is the embedding-facing API: connect with automatic
//! bounded reconnection, issue send/join/typing actions, and receive inbound
//! events through callback hooks. The `huddle-client` binary wraps it in an
//! interactive terminal UI.

pub mod error;
pub mod facade;
pub mod formatter;
pub mod retry;
mod session;

pub use error::ClientError;
pub use facade::{Callbacks, ChatClient, ChatConfig};
