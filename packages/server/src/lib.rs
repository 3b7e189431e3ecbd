//! Huddle chat server.
//!
//! Accepts persistent WebSocket connections, authenticates them at the
//! session gate, routes messages (broadcast, room, private) through the
//! dispatcher, rate-limits senders, and replays bounded history to newly
//! joined participants. All state is process-memory-only.

pub mod dispatcher;
pub mod gate;
pub mod handler;
pub mod history;
pub mod pusher;
pub mod rate_limit;
pub mod registry;
pub mod runner;
pub mod state;
