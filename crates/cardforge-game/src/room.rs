//! A room: chat space, user roster, and directory of games.

use std::collections::HashMap;

use cardforge_protocol::{GameId, GameInfo, RoomDetails, RoomId, RoomInfo, UserInfo};
use cardforge_transport::ConnectionId;

use crate::{GameError, GameHandle};

/// One room. Membership and the game directory live here; the games
/// themselves run in their own actor tasks, reachable through the
/// stored handles.
///
/// The directory keeps a cached [`GameInfo`] per game so listings never
/// have to round-trip through every game actor; the server refreshes an
/// entry whenever it learns a game changed.
pub struct Room {
    pub room_id: RoomId,
    pub name: String,
    pub description: String,
    pub auto_join: bool,
    pub game_types: Vec<String>,
    members: HashMap<ConnectionId, UserInfo>,
    games: HashMap<GameId, (GameHandle, GameInfo)>,
}

impl Room {
    pub fn new(
        room_id: RoomId,
        name: impl Into<String>,
        description: impl Into<String>,
        auto_join: bool,
        game_types: Vec<String>,
    ) -> Self {
        Self {
            room_id,
            name: name.into(),
            description: description.into(),
            auto_join,
            game_types,
            members: HashMap::new(),
            games: HashMap::new(),
        }
    }

    pub fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            name: self.name.clone(),
            description: self.description.clone(),
            player_count: self.members.len(),
            game_count: self.games.len(),
            auto_join: self.auto_join,
        }
    }

    /// The full snapshot a joining user receives.
    pub fn details(&self) -> RoomDetails {
        let mut users: Vec<UserInfo> = self.members.values().cloned().collect();
        users.sort_by(|a, b| a.name.cmp(&b.name));
        let mut games: Vec<GameInfo> = self.games.values().map(|(_, info)| info.clone()).collect();
        games.sort_by_key(|g| g.game_id.0);
        RoomDetails {
            info: self.info(),
            users,
            games,
            game_types: self.game_types.clone(),
        }
    }

    /// All members with their connections, for room-event fanout.
    pub fn members(&self) -> impl Iterator<Item = (ConnectionId, &UserInfo)> {
        self.members.iter().map(|(c, u)| (*c, u))
    }

    pub fn join(&mut self, conn_id: ConnectionId, user: UserInfo) -> Result<(), GameError> {
        if self.members.contains_key(&conn_id) {
            return Err(GameError::OutOfContext("already in this room".into()));
        }
        self.members.insert(conn_id, user);
        Ok(())
    }

    /// Removes a member, returning who it was.
    pub fn leave(&mut self, conn_id: ConnectionId) -> Result<UserInfo, GameError> {
        self.members
            .remove(&conn_id)
            .ok_or(GameError::NotInRoom(self.room_id))
    }

    pub fn add_game(&mut self, handle: GameHandle, info: GameInfo) {
        self.games.insert(handle.game_id(), (handle, info));
    }

    pub fn game(&self, game_id: GameId) -> Result<&GameHandle, GameError> {
        self.games
            .get(&game_id)
            .map(|(handle, _)| handle)
            .ok_or(GameError::GameNotFound(game_id))
    }

    /// Refreshes the cached directory entry for a game.
    pub fn update_game_info(&mut self, info: GameInfo) {
        if let Some(entry) = self.games.get_mut(&info.game_id) {
            entry.1 = info;
        }
    }

    pub fn remove_game(&mut self, game_id: GameId) -> Option<GameHandle> {
        self.games.remove(&game_id).map(|(handle, _)| handle)
    }
}
