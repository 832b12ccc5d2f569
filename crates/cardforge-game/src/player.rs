//! A seat at the table: one player or spectator inside a game.

use cardforge_protocol::{Counter, PlayerId, PlayerInfo, UserInfo};

use crate::{GameError, Zone};

/// A participant's full in-game state. Spectators get a seat id but no
/// zones or counters.
#[derive(Debug)]
pub struct Player {
    pub player_id: PlayerId,
    pub user: UserInfo,
    pub spectator: bool,
    pub conceded: bool,
    pub ready_start: bool,
    pub deck_hash: String,
    pub zones: Vec<Zone>,
    pub counters: Vec<Counter>,
    next_counter_id: u64,
}

impl Player {
    pub fn new(player_id: PlayerId, user: UserInfo, spectator: bool) -> Self {
        Self {
            player_id,
            user,
            spectator,
            conceded: false,
            ready_start: false,
            deck_hash: String::new(),
            zones: if spectator { Vec::new() } else { Zone::standard_set() },
            counters: Vec::new(),
            next_counter_id: 1,
        }
    }

    pub fn zone(&self, name: &str) -> Result<&Zone, GameError> {
        self.zones
            .iter()
            .find(|z| z.name == name)
            .ok_or_else(|| GameError::ZoneNotFound(name.to_owned()))
    }

    pub fn zone_mut(&mut self, name: &str) -> Result<&mut Zone, GameError> {
        self.zones
            .iter_mut()
            .find(|z| z.name == name)
            .ok_or_else(|| GameError::ZoneNotFound(name.to_owned()))
    }

    /// Creates a player counter and returns a copy of it.
    pub fn create_counter(&mut self, name: &str, color: &str, radius: i32, value: i32) -> Counter {
        let counter = Counter {
            id: self.next_counter_id,
            name: name.to_owned(),
            color: color.to_owned(),
            radius,
            value,
        };
        self.next_counter_id += 1;
        self.counters.push(counter.clone());
        counter
    }

    pub fn counter_mut(&mut self, counter_id: u64) -> Result<&mut Counter, GameError> {
        self.counters
            .iter_mut()
            .find(|c| c.id == counter_id)
            .ok_or(GameError::CounterNotFound(counter_id))
    }

    pub fn delete_counter(&mut self, counter_id: u64) -> Result<(), GameError> {
        let pos = self
            .counters
            .iter()
            .position(|c| c.id == counter_id)
            .ok_or(GameError::CounterNotFound(counter_id))?;
        self.counters.remove(pos);
        Ok(())
    }

    /// The seat as one observer sees it. `observer_is_self` grants the
    /// own-view; `omniscient` is the spectators-see-everything case.
    pub fn to_info(&self, observer_is_self: bool, omniscient: bool) -> PlayerInfo {
        PlayerInfo {
            player_id: self.player_id,
            user: self.user.clone(),
            spectator: self.spectator,
            conceded: self.conceded,
            ready_start: self.ready_start,
            deck_hash: self.deck_hash.clone(),
            zones: self
                .zones
                .iter()
                .map(|z| z.to_info(observer_is_self, omniscient))
                .collect(),
            counters: self.counters.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardforge_protocol::UserLevel;

    fn user() -> UserInfo {
        UserInfo {
            name: "alice".into(),
            level: UserLevel::Registered,
        }
    }

    #[test]
    fn test_players_get_standard_zones_spectators_none() {
        let player = Player::new(PlayerId(0), user(), false);
        assert_eq!(player.zones.len(), 6);
        let spectator = Player::new(PlayerId(1), user(), true);
        assert!(spectator.zones.is_empty());
    }

    #[test]
    fn test_counter_ids_are_per_player_and_increasing() {
        let mut player = Player::new(PlayerId(0), user(), false);
        let life = player.create_counter("life", "white", 25, 20);
        let poison = player.create_counter("poison", "green", 15, 0);
        assert_eq!(life.id, 1);
        assert_eq!(poison.id, 2);
        player.delete_counter(life.id).unwrap();
        assert_eq!(
            player.delete_counter(life.id),
            Err(GameError::CounterNotFound(1))
        );
        player.counter_mut(poison.id).unwrap().value = 3;
        assert_eq!(player.counters[0].value, 3);
    }

    #[test]
    fn test_unknown_zone_is_an_error() {
        let player = Player::new(PlayerId(0), user(), false);
        assert_eq!(
            player.zone("stack").unwrap_err(),
            GameError::ZoneNotFound("stack".into())
        );
    }
}
