//! Registry of active connections, their identities, and room membership.

use std::collections::{HashMap, HashSet};

use huddle_shared::protocol::UserStatus;

/// Tracks every admitted connection and the rooms it has joined.
///
/// Identities are owned exclusively by the registry: `is_online` and
/// `last_seen` are only ever mutated here. Room membership is an explicit
/// room-id to connection-id set mapping; empty rooms are removed as soon as
/// the last member leaves.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: HashMap<String, UserStatus>,
    rooms: HashMap<String, HashSet<String>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a freshly admitted connection under its connection id.
    pub fn register(&mut self, connection_id: String, identity: UserStatus) {
        self.connections.insert(connection_id, identity);
    }

    /// Remove a connection, stamping its identity offline as of `now`.
    ///
    /// Also drops the connection from every room it had joined. Returns the
    /// final identity so the caller can notify remaining connections.
    pub fn unregister(&mut self, connection_id: &str, now: i64) -> Option<UserStatus> {
        self.rooms.retain(|_, members| {
            members.remove(connection_id);
            !members.is_empty()
        });

        let mut identity = self.connections.remove(connection_id)?;
        identity.is_online = false;
        identity.last_seen = now;
        Some(identity)
    }

    pub fn identity(&self, connection_id: &str) -> Option<&UserStatus> {
        self.connections.get(connection_id)
    }

    /// Add a connection to a room's fan-out group. Unknown rooms are created
    /// on first join; joining twice is a no-op.
    pub fn join_room(&mut self, room_id: &str, connection_id: &str) {
        self.rooms
            .entry(room_id.to_string())
            .or_default()
            .insert(connection_id.to_string());
    }

    /// Remove a connection from a room. No-op when not a member; the room
    /// entry is dropped when its last member leaves.
    pub fn leave_room(&mut self, room_id: &str, connection_id: &str) {
        if let Some(members) = self.rooms.get_mut(room_id) {
            members.remove(connection_id);
            if members.is_empty() {
                self.rooms.remove(room_id);
            }
        }
    }

    pub fn is_room_member(&self, room_id: &str, connection_id: &str) -> bool {
        self.rooms
            .get(room_id)
            .is_some_and(|members| members.contains(connection_id))
    }

    /// All current members of a room, in arbitrary order.
    pub fn room_members(&self, room_id: &str) -> Vec<String> {
        self.rooms
            .get(room_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Members of a room, excluding one connection.
    pub fn room_members_except(&self, room_id: &str, exclude: &str) -> Vec<String> {
        self.rooms
            .get(room_id)
            .map(|members| {
                members
                    .iter()
                    .filter(|id| id.as_str() != exclude)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every registered connection id.
    pub fn all_connections(&self) -> Vec<String> {
        self.connections.keys().cloned().collect()
    }

    /// Every registered connection id except one.
    pub fn connections_except(&self, exclude: &str) -> Vec<String> {
        self.connections
            .keys()
            .filter(|id| id.as_str() != exclude)
            .cloned()
            .collect()
    }

    /// Connections whose identity belongs to `user_id`. One physical
    /// connection per identity today, but routing stays user-keyed.
    pub fn connections_for_user(&self, user_id: &str) -> Vec<String> {
        self.connections
            .iter()
            .filter(|(_, identity)| identity.id == user_id)
            .map(|(connection_id, _)| connection_id.clone())
            .collect()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: &str, name: &str) -> UserStatus {
        UserStatus {
            id: id.to_string(),
            display_name: name.to_string(),
            is_online: true,
            last_seen: 1_000,
        }
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = ConnectionRegistry::new();
        registry.register("c1".to_string(), identity("c1", "Alice"));

        let found = registry.identity("c1").unwrap();
        assert_eq!(found.display_name, "Alice");
        assert!(found.is_online);
        assert!(registry.identity("c2").is_none());
    }

    #[test]
    fn unregister_stamps_offline_and_last_seen() {
        let mut registry = ConnectionRegistry::new();
        registry.register("c1".to_string(), identity("c1", "Alice"));

        let departed = registry.unregister("c1", 5_000).unwrap();
        assert!(!departed.is_online);
        assert_eq!(departed.last_seen, 5_000);
        assert!(registry.identity("c1").is_none());
        assert!(registry.unregister("c1", 5_000).is_none());
    }

    #[test]
    fn unregister_removes_room_memberships() {
        let mut registry = ConnectionRegistry::new();
        registry.register("c1".to_string(), identity("c1", "Alice"));
        registry.register("c2".to_string(), identity("c2", "Bob"));
        registry.join_room("ops", "c1");
        registry.join_room("ops", "c2");

        registry.unregister("c1", 5_000);
        assert_eq!(registry.room_members("ops"), vec!["c2".to_string()]);
    }

    #[test]
    fn join_and_leave_room() {
        let mut registry = ConnectionRegistry::new();
        registry.join_room("ops", "c1");
        registry.join_room("ops", "c1"); // idempotent
        assert!(registry.is_room_member("ops", "c1"));
        assert_eq!(registry.room_members("ops").len(), 1);

        registry.leave_room("ops", "c1");
        assert!(!registry.is_room_member("ops", "c1"));
        // leaving a room we're not in is a no-op
        registry.leave_room("ops", "c1");
        registry.leave_room("nowhere", "c1");
    }

    #[test]
    fn empty_rooms_are_garbage_collected() {
        let mut registry = ConnectionRegistry::new();
        registry.join_room("ops", "c1");
        registry.leave_room("ops", "c1");
        assert!(registry.rooms.is_empty());

        registry.join_room("dev", "c2");
        registry.register("c2".to_string(), identity("c2", "Bob"));
        registry.unregister("c2", 2_000);
        assert!(registry.rooms.is_empty());
    }

    #[test]
    fn connections_except_excludes_only_the_given_id() {
        let mut registry = ConnectionRegistry::new();
        registry.register("c1".to_string(), identity("c1", "Alice"));
        registry.register("c2".to_string(), identity("c2", "Bob"));
        registry.register("c3".to_string(), identity("c3", "Carol"));

        let mut others = registry.connections_except("c1");
        others.sort();
        assert_eq!(others, vec!["c2".to_string(), "c3".to_string()]);
        assert_eq!(registry.all_connections().len(), 3);
    }

    #[test]
    fn room_members_except_excludes_the_sender() {
        let mut registry = ConnectionRegistry::new();
        registry.join_room("ops", "c1");
        registry.join_room("ops", "c2");

        assert_eq!(
            registry.room_members_except("ops", "c1"),
            vec!["c2".to_string()]
        );
    }

    #[test]
    fn connections_for_user_matches_identity_id() {
        let mut registry = ConnectionRegistry::new();
        registry.register("c1".to_string(), identity("c1", "Alice"));
        registry.register("c2".to_string(), identity("c2", "Bob"));

        assert_eq!(registry.connections_for_user("c2"), vec!["c2".to_string()]);
        assert!(registry.connections_for_user("ghost").is_empty());
    }
}
