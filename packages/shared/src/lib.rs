//! Shared library for the Huddle chat system.
//!
//! Contains the wire protocol types exchanged between server and client,
//! plus the clock and logging utilities both sides use.

pub mod logger;
pub mod protocol;
pub mod time;
