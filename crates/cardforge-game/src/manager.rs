//! The room registry: every room on the server, plus id allocation.

use std::collections::BTreeMap;

use cardforge_protocol::{GameId, RoomId, RoomInfo};

use crate::{GameError, Room};

/// Owns all rooms. Lives behind the server's mutex; not thread-safe by
/// itself.
#[derive(Default)]
pub struct Rooms {
    rooms: BTreeMap<RoomId, Room>,
    next_room_id: u64,
    next_game_id: u64,
}

impl Rooms {
    pub fn new() -> Self {
        Self {
            rooms: BTreeMap::new(),
            next_room_id: 1,
            next_game_id: 1,
        }
    }

    pub fn add_room(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        auto_join: bool,
        game_types: Vec<String>,
    ) -> RoomId {
        let room_id = RoomId(self.next_room_id);
        self.next_room_id += 1;
        self.rooms
            .insert(room_id, Room::new(room_id, name, description, auto_join, game_types));
        tracing::info!(%room_id, "room created");
        room_id
    }

    pub fn room(&self, room_id: RoomId) -> Result<&Room, GameError> {
        self.rooms.get(&room_id).ok_or(GameError::RoomNotFound(room_id))
    }

    pub fn room_mut(&mut self, room_id: RoomId) -> Result<&mut Room, GameError> {
        self.rooms
            .get_mut(&room_id)
            .ok_or(GameError::RoomNotFound(room_id))
    }

    /// Directory entries for every room, in id order.
    pub fn infos(&self) -> Vec<RoomInfo> {
        self.rooms.values().map(Room::info).collect()
    }

    /// Allocates a server-unique game id.
    pub fn next_game_id(&mut self) -> GameId {
        let id = GameId(self.next_game_id);
        self.next_game_id += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_ids_and_game_ids_are_unique() {
        let mut rooms = Rooms::new();
        let a = rooms.add_room("Main", "", true, vec![]);
        let b = rooms.add_room("Casual", "", false, vec![]);
        assert_ne!(a, b);
        assert_ne!(rooms.next_game_id(), rooms.next_game_id());
    }

    #[test]
    fn test_unknown_room_lookup_fails() {
        let rooms = Rooms::new();
        assert!(matches!(
            rooms.room(RoomId(42)),
            Err(GameError::RoomNotFound(RoomId(42)))
        ));
    }
}
