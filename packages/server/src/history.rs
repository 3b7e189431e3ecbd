//! Bounded, append-only store of recently sent messages.

use std::collections::VecDeque;

use huddle_shared::protocol::{ChatMessage, Scope};

/// Maximum number of messages retained.
pub const HISTORY_CAPACITY: usize = 50;

/// Fixed-capacity FIFO ring of the most recent messages, insertion-ordered.
///
/// All scopes share one ring: private messages count against the capacity but
/// are never returned by either query, so a reconnecting private-message
/// participant only sees live future messages.
pub struct HistoryBuffer {
    capacity: usize,
    messages: VecDeque<ChatMessage>,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            messages: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a message, evicting the oldest when over capacity.
    pub fn append(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
        if self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
    }

    /// Global broadcasts (neither room nor recipient set), oldest first.
    pub fn global_history(&self) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .filter(|m| m.scope() == Scope::Global)
            .cloned()
            .collect()
    }

    /// Messages addressed to `room_id`, oldest first.
    pub fn room_history(&self, room_id: &str) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .filter(|m| m.scope() == Scope::Room(room_id))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}
