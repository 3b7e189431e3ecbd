//! Wire protocol for the Huddle chat system.
//!
//! Events are JSON text frames, adjacently tagged as `{"type": ..., "data": ...}`
//! so the dispatcher can match on them exhaustively. Field names are camelCase
//! on the wire.

use serde::{Deserialize, Serialize};

/// Error code sent when a sender exceeds the message rate limit.
pub const ERROR_CODE_RATE_LIMIT: &str = "RATE_LIMIT";

/// A single chat message. Immutable once created.
///
/// At most one of `room_id` / `to_user_id` is set; if neither is set the
/// message is a global broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Globally unique message id (uuid v4).
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_user_id: Option<String>,
}

/// Routing target of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    Global,
    Room(&'a str),
    Private(&'a str),
}

impl ChatMessage {
    /// The scope this message belongs to. A message with both `room_id` and
    /// `to_user_id` set never reaches storage or routing (the dispatcher
    /// rejects it as malformed), so private takes precedence here.
    pub fn scope(&self) -> Scope<'_> {
        if let Some(user_id) = self.to_user_id.as_deref() {
            Scope::Private(user_id)
        } else if let Some(room_id) = self.room_id.as_deref() {
            Scope::Room(room_id)
        } else {
            Scope::Global
        }
    }
}

/// Online status of one identity, broadcast on connect and disconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatus {
    pub id: String,
    pub display_name: String,
    pub is_online: bool,
    /// Unix timestamp in milliseconds of the last status change.
    pub last_seen: i64,
}

/// Typing indicator relayed to other participants. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingNotice {
    pub user_id: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<String>,
}

/// Structured error surfaced to a single client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorNotice {
    pub code: String,
    pub message: String,
}

impl ErrorNotice {
    pub fn rate_limit() -> Self {
        Self {
            code: ERROR_CODE_RATE_LIMIT.to_string(),
            message: "You are sending messages too fast.".to_string(),
        }
    }
}

/// Events a client sends to the server after the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    JoinRoom {
        room_id: String,
    },
    LeaveRoom {
        room_id: String,
    },
    SendMessage {
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to_user_id: Option<String>,
    },
    Typing {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<String>,
    },
}

/// Events the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    Message(ChatMessage),
    UserStatus(UserStatus),
    Typing(TypingNotice),
    Error(ErrorNotice),
    History(Vec<ChatMessage>),
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
            timestamp: 1_000,
            room_id: room_id.map(str::to_string),
            to_user_id: to_user_id.map(str::to_string),
        }
    }

    #[test]
    fn scope_is_global_when_neither_field_is_set() {
        assert_eq!(message(None, None).scope(), Scope::Global);
    }

    #[test]
    fn scope_picks_room_and_private() {
        assert_eq!(message(Some("ops"), None).scope(), Scope::Room("ops"));
        assert_eq!(message(None, Some("u2")).scope(), Scope::Private("u2"));
    }

    #[test]
    fn client_event_uses_camel_case_tags_and_fields() {
        let json = serde_json::to_string(&ClientEvent::JoinRoom {
            room_id: "ops".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"joinRoom","data":{"roomId":"ops"}}"#);
    }

    #[test]
    fn send_message_omits_unset_scope_fields() {
        let json = serde_json::to_string(&ClientEvent::SendMessage {
            content: "hi".to_string(),
            room_id: None,
            to_user_id: None,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"sendMessage","data":{"content":"hi"}}"#);
    }

    #[test]
    fn server_event_history_round_trips_as_a_list() {
        let event = ServerEvent::History(vec![message(None, None)]);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.starts_with(r#"{"type":"history","data":["#));
        let parsed: ServerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn unknown_event_type_fails_to_parse() {
        let result = serde_json::from_str::<ClientEvent>(r#"{"type":"shutdown","data":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn rate_limit_notice_carries_the_documented_code() {
        assert_eq!(ErrorNotice::rate_limit().code, "RATE_LIMIT");
    }
}
