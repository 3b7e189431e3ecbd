//! Terminal formatting for the CLI client.

use chrono::{DateTime, Utc};

use huddle_shared::protocol::{ChatMessage, ErrorNotice, TypingNotice, UserStatus};

/// Message formatter for terminal display.
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format an incoming chat message with its scope marker.
    pub fn format_message(message: &ChatMessage) -> String {
        let time = format_time(message.timestamp);
        let scope = if message.to_user_id.is_some() {
            " (private)".to_string()
        } else if let Some(room) = &message.room_id {
            format!(" [#{room}]")
        } else {
            String::new()
        };
        format!(
            "\n[{}] {}{}: {}\n",
            time, message.sender_name, scope, message.content
        )
    }

    pub fn format_typing(notice: &TypingNotice) -> String {
        match &notice.room_id {
            Some(room) => format!("\n… {} is typing in #{room}\n", notice.display_name),
            None => format!("\n… {} is typing\n", notice.display_name),
        }
    }

    pub fn format_status(status: &UserStatus) -> String {
        if status.is_online {
            format!("\n+ {} is online\n", status.display_name)
        } else {
            format!(
                "\n- {} went offline at {}\n",
                status.display_name,
                format_time(status.last_seen)
            )
        }
    }

    pub fn format_error(notice: &ErrorNotice) -> String {
        format!("\n! {}: {}\n", notice.code, notice.message)
    }
}

fn format_time(timestamp_millis: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(timestamp_millis) {
        Some(dt) => dt.format("%H:%M:%S").to_string(),
        None => timestamp_millis.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(room_id: Option<&str>, to_user_id: Option<&str>) -> ChatMessage {
        ChatMessage {
            id: "m1".to_string(),
            sender_id: "u1".to_string(),
            sender_name: "Alice".to_string(),
            content: "hi".to_string(),
            timestamp: 0,
            room_id: room_id.map(str::to_string),
            to_user_id: to_user_id.map(str::to_string),
        }
    }

    #[test]
    fn broadcast_message_has_no_scope_marker() {
        let out = MessageFormatter::format_message(&message(None, None));
        assert!(out.contains("Alice: hi"));
        assert!(!out.contains('#'));
        assert!(!out.contains("private"));
    }

    #[test]
    fn room_and_private_messages_are_marked() {
        assert!(MessageFormatter::format_message(&message(Some("ops"), None)).contains("[#ops]"));
        assert!(MessageFormatter::format_message(&message(None, Some("u2"))).contains("(private)"));
    }

    #[test]
    fn offline_status_shows_last_seen() {
        let status = UserStatus {
            id: "u1".to_string(),
            display_name: "Bob".to_string(),
            is_online: false,
            last_seen: 0,
        };
        let out = MessageFormatter::format_status(&status);
        assert!(out.contains("Bob went offline at 00:00:00"));
    }
}
