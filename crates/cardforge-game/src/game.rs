//! The authoritative state of one game and every mutation on it.
//!
//! All methods are synchronous and run inside the game's actor task, so
//! each command observes the previous one's effects. Every mutation
//! validates completely before touching state: a failed command leaves
//! the game exactly as it was.

use std::collections::BTreeMap;

use rand::Rng;
use sha2::{Digest, Sha256};

use cardforge_protocol::{
    AttachRef, CardId, CardToMove, GameCmd, GameEvent, GameId, GameInfo,
    PlayerId, PlayerInfo, RoomId, UserInfo, ZoneInfo, ZoneKind,
};

use crate::{Card, GameError, Observer, Player, Scoped};

/// Immutable game options fixed at creation.
#[derive(Debug, Clone)]
pub struct GameSettings {
    pub description: String,
    pub password: String,
    pub max_players: usize,
    pub only_buddies: bool,
    pub spectators_allowed: bool,
    pub spectators_need_password: bool,
    pub spectators_can_talk: bool,
    pub spectators_see_everything: bool,
}

/// One game. Owns every seat, zone, and card in it.
#[derive(Debug)]
pub struct Game {
    pub game_id: GameId,
    pub room_id: RoomId,
    pub creator: UserInfo,
    settings: GameSettings,
    started: bool,
    active_player: Option<PlayerId>,
    active_phase: u32,
    players: BTreeMap<PlayerId, Player>,
    next_player_id: u64,
    next_card_id: i64,
}

impl Game {
    pub fn new(game_id: GameId, room_id: RoomId, creator: UserInfo, settings: GameSettings) -> Self {
        Self {
            game_id,
            room_id,
            creator,
            settings,
            started: false,
            active_player: None,
            active_phase: 0,
            players: BTreeMap::new(),
            next_player_id: 0,
            next_card_id: 1,
        }
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// The game's directory entry.
    pub fn info(&self) -> GameInfo {
        GameInfo {
            game_id: self.game_id,
            room_id: self.room_id,
            description: self.settings.description.clone(),
            creator: self.creator.clone(),
            has_password: !self.settings.password.is_empty(),
            only_buddies: self.settings.only_buddies,
            spectators_allowed: self.settings.spectators_allowed,
            spectators_need_password: self.settings.spectators_need_password,
            spectators_can_talk: self.settings.spectators_can_talk,
            spectators_see_everything: self.settings.spectators_see_everything,
            max_players: self.settings.max_players,
            player_count: self.players.values().filter(|p| !p.spectator).count(),
            spectator_count: self.players.values().filter(|p| p.spectator).count(),
            started: self.started,
        }
    }

    /// All seats currently in the game.
    pub fn participants(&self) -> Vec<PlayerId> {
        self.players.keys().copied().collect()
    }

    /// How a seat observes this game.
    pub fn observer(&self, seat: PlayerId) -> Observer {
        let omniscient = self
            .players
            .get(&seat)
            .is_some_and(|p| p.spectator && self.settings.spectators_see_everything);
        Observer { seat, omniscient }
    }

    /// The game state as one seat sees it.
    pub fn snapshot_for(&self, seat: PlayerId) -> Vec<PlayerInfo> {
        let observer = self.observer(seat);
        self.players
            .values()
            .map(|p| p.to_info(p.player_id == seat, observer.omniscient))
            .collect()
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    /// Seats a player or spectator.
    ///
    /// `is_buddy` is precomputed by the caller from the creator's buddy
    /// list; the game itself has no store access.
    pub fn join(
        &mut self,
        user: UserInfo,
        password: &str,
        spectator: bool,
        is_buddy: bool,
    ) -> Result<(PlayerId, Vec<Scoped>), GameError> {
        if self.players.values().any(|p| p.user.name == user.name) {
            return Err(GameError::OutOfContext("already in this game".into()));
        }
        if self.settings.only_buddies && !is_buddy && user.name != self.creator.name {
            return Err(GameError::OnlyBuddies);
        }
        if spectator {
            if !self.settings.spectators_allowed {
                return Err(GameError::SpectatorsNotAllowed);
            }
            if self.settings.spectators_need_password
                && !self.settings.password.is_empty()
                && password != self.settings.password
            {
                return Err(GameError::WrongPassword);
            }
        } else {
            if self.started {
                return Err(GameError::OutOfContext("game already started".into()));
            }
            if self.players.values().filter(|p| !p.spectator).count() >= self.settings.max_players
            {
                return Err(GameError::GameFull(self.game_id));
            }
            if !self.settings.password.is_empty() && password != self.settings.password {
                return Err(GameError::WrongPassword);
            }
        }

        let seat = PlayerId(self.next_player_id);
        self.next_player_id += 1;
        let player = Player::new(seat, user, spectator);
        let event = Scoped::Public(GameEvent::Joined {
            player: player.to_info(false, false),
        });
        self.players.insert(seat, player);
        Ok((seat, vec![event]))
    }

    /// Removes a seat. Detaches everything attached to its cards.
    pub fn leave(&mut self, seat: PlayerId) -> Result<Vec<Scoped>, GameError> {
        let player = self
            .players
            .remove(&seat)
            .ok_or(GameError::NotInGame(self.game_id))?;
        let mut events = Vec::new();
        for zone in &player.zones {
            for card in &zone.cards {
                events.extend(self.detach_all_from(&AttachRef {
                    player_id: seat,
                    zone: zone.name.clone(),
                    card_id: card.id,
                }));
            }
        }
        events.push(Scoped::Public(GameEvent::Left { player_id: seat }));
        if self.started && self.active_player == Some(seat) {
            events.extend(self.advance_turn(seat));
        }
        Ok(events)
    }

    // -----------------------------------------------------------------
    // Command dispatch
    // -----------------------------------------------------------------

    /// Applies one in-game command for a seat, returning the scoped
    /// events describing what changed.
    pub fn apply(&mut self, seat: PlayerId, cmd: GameCmd) -> Result<Vec<Scoped>, GameError> {
        let player = self
            .players
            .get(&seat)
            .ok_or(GameError::NotInGame(self.game_id))?;
        let spectator = player.spectator;

        match &cmd {
            GameCmd::Say { .. } | GameCmd::Leave => {}
            _ if spectator => {
                return Err(GameError::NotAllowed("spectators cannot act".into()));
            }
            GameCmd::SetDeck { .. } | GameCmd::ReadyStart if self.started => {
                return Err(GameError::OutOfContext("game already started".into()));
            }
            GameCmd::SetDeck { .. } | GameCmd::ReadyStart => {}
            _ if !self.started => return Err(GameError::NotStarted),
            _ => {}
        }

        match cmd {
            GameCmd::Leave => self.leave(seat),
            GameCmd::Say { text } => {
                if spectator && !self.settings.spectators_can_talk {
                    return Err(GameError::NotAllowed("spectators cannot talk here".into()));
                }
                Ok(vec![Scoped::Public(GameEvent::Say { player_id: seat, text })])
            }
            GameCmd::SetDeck { deck } => self.set_deck(seat, &deck),
            GameCmd::ReadyStart => self.ready_start(seat),
            GameCmd::Concede => self.concede(seat),
            GameCmd::Shuffle => {
                self.player_mut(seat)?.zone_mut("deck")?.shuffle();
                Ok(vec![Scoped::Public(GameEvent::Shuffle {
                    player_id: seat,
                    zone: "deck".into(),
                })])
            }
            GameCmd::RollDie { sides } => {
                if sides == 0 {
                    return Err(GameError::InvalidData("die with zero sides".into()));
                }
                let value = rand::rng().random_range(1..=sides);
                Ok(vec![Scoped::Public(GameEvent::RollDie {
                    player_id: seat,
                    sides,
                    value,
                })])
            }
            GameCmd::DrawCards { number } => self.draw_cards(seat, number),
            GameCmd::MoveCard { cards, start_zone, target_zone, x, y } => {
                self.move_cards(seat, &cards, &start_zone, &target_zone, x, y)
            }
            GameCmd::CreateToken { zone, name, pt, color, x, y } => {
                self.create_token(seat, &zone, &name, &pt, &color, x, y)
            }
            GameCmd::SetCardAttr { zone, card_id, attr, value } => {
                let card = self.player_mut(seat)?.zone_mut(&zone)?.card_mut(card_id)?;
                card.set_attr(attr, &value)?;
                Ok(vec![Scoped::Public(GameEvent::SetCardAttr {
                    player_id: seat,
                    zone,
                    card_id,
                    attr,
                    value,
                })])
            }
            GameCmd::CreateCounter { name, color, radius, value } => {
                let counter = self
                    .player_mut(seat)?
                    .create_counter(&name, &color, radius, value);
                Ok(vec![Scoped::Public(GameEvent::CreateCounter {
                    player_id: seat,
                    counter,
                })])
            }
            GameCmd::SetCounter { counter_id, value } => {
                self.player_mut(seat)?.counter_mut(counter_id)?.value = value;
                Ok(vec![Scoped::Public(GameEvent::SetCounter {
                    player_id: seat,
                    counter_id,
                    value,
                })])
            }
            GameCmd::IncCounter { counter_id, delta } => {
                let counter = self.player_mut(seat)?.counter_mut(counter_id)?;
                counter.value = counter.value.saturating_add(delta);
                let value = counter.value;
                Ok(vec![Scoped::Public(GameEvent::SetCounter {
                    player_id: seat,
                    counter_id,
                    value,
                })])
            }
            GameCmd::DelCounter { counter_id } => {
                self.player_mut(seat)?.delete_counter(counter_id)?;
                Ok(vec![Scoped::Public(GameEvent::DelCounter {
                    player_id: seat,
                    counter_id,
                })])
            }
            GameCmd::SetActivePlayer { player_id } => {
                let target = self
                    .players
                    .get(&player_id)
                    .ok_or(GameError::PlayerNotFound(player_id.0))?;
                if target.spectator || target.conceded {
                    return Err(GameError::OutOfContext(
                        "that seat cannot take the turn".into(),
                    ));
                }
                self.active_player = Some(player_id);
                Ok(vec![Scoped::Public(GameEvent::SetActivePlayer {
                    player_id: seat,
                    active_player: player_id,
                })])
            }
            GameCmd::SetActivePhase { phase } => {
                self.active_phase = phase;
                Ok(vec![Scoped::Public(GameEvent::SetActivePhase {
                    player_id: seat,
                    phase,
                })])
            }
            GameCmd::NextTurn => {
                let mut events = self.advance_turn(seat);
                self.active_phase = 0;
                events.push(Scoped::Public(GameEvent::SetActivePhase {
                    player_id: seat,
                    phase: 0,
                }));
                Ok(events)
            }
            GameCmd::AttachCard {
                start_zone,
                card_id,
                target_player_id,
                target_zone,
                target_card_id,
            } => self.attach_card(seat, &start_zone, card_id, target_player_id, &target_zone, target_card_id),
            GameCmd::DetachCard { zone, card_id } => {
                let card = self.player_mut(seat)?.zone_mut(&zone)?.card_mut(card_id)?;
                if card.attached_to.take().is_none() {
                    return Err(GameError::OutOfContext("card is not attached".into()));
                }
                Ok(vec![Scoped::Public(GameEvent::AttachCard {
                    player_id: seat,
                    start_zone: zone,
                    card_id,
                    target: None,
                })])
            }
            GameCmd::DumpZone { player_id, zone, number_cards } => {
                self.dump_zone(seat, player_id, &zone, number_cards)
            }
        }
    }

    // -----------------------------------------------------------------
    // Individual operations
    // -----------------------------------------------------------------

    fn set_deck(&mut self, seat: PlayerId, deck: &str) -> Result<Vec<Scoped>, GameError> {
        let mut main = Vec::new();
        let mut side = Vec::new();
        for line in deck.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            let (target, line) = match line.strip_prefix("SB:") {
                Some(rest) => (&mut side, rest.trim()),
                None => (&mut main, line),
            };
            let (count, name) = match line.split_once(' ') {
                Some((n, rest)) => match n.parse::<u32>() {
                    Ok(count) => (count, rest.trim()),
                    Err(_) => (1, line),
                },
                None => (1, line),
            };
            if name.is_empty() {
                return Err(GameError::InvalidData("card line without a name".into()));
            }
            for _ in 0..count {
                target.push(name.to_owned());
            }
        }
        if main.is_empty() {
            return Err(GameError::InvalidData("deck has no cards".into()));
        }

        let digest = Sha256::digest(deck.as_bytes());
        let deck_hash = hex::encode(&digest[..8]);

        let mut cards: Vec<Card> = Vec::with_capacity(main.len());
        for name in main {
            cards.push(Card::new(self.fresh_card_id(), name));
        }
        let mut sb_cards: Vec<Card> = Vec::with_capacity(side.len());
        for name in side {
            sb_cards.push(Card::new(self.fresh_card_id(), name));
        }

        let player = self.player_mut(seat)?;
        player.zone_mut("deck")?.cards = cards;
        player.zone_mut("sb")?.cards = sb_cards;
        player.deck_hash = deck_hash.clone();

        Ok(vec![Scoped::Public(GameEvent::DeckSelect {
            player_id: seat,
            deck_hash,
        })])
    }

    fn ready_start(&mut self, seat: PlayerId) -> Result<Vec<Scoped>, GameError> {
        let player = self.player_mut(seat)?;
        if player.ready_start {
            return Err(GameError::OutOfContext("already ready".into()));
        }
        player.ready_start = true;
        let mut events = vec![Scoped::Public(GameEvent::ReadyStart {
            player_id: seat,
            ready: true,
        })];

        let all_ready = self
            .players
            .values()
            .filter(|p| !p.spectator)
            .all(|p| p.ready_start);
        if all_ready {
            self.started = true;
            self.active_phase = 0;
            let first = self
                .players
                .values()
                .find(|p| !p.spectator)
                .map(|p| p.player_id)
                .ok_or(GameError::OutOfContext("no players seated".into()))?;
            self.active_player = Some(first);
            tracing::info!(game_id = %self.game_id, active_player = %first, "game started");
            events.push(Scoped::Public(GameEvent::GameStarted { active_player: first }));
        }
        Ok(events)
    }

    fn concede(&mut self, seat: PlayerId) -> Result<Vec<Scoped>, GameError> {
        let player = self.player_mut(seat)?;
        if player.conceded {
            return Err(GameError::OutOfContext("already conceded".into()));
        }
        player.conceded = true;
        let mut events = vec![Scoped::Public(GameEvent::Concede { player_id: seat })];
        if self.active_player == Some(seat) {
            events.extend(self.advance_turn(seat));
        }
        Ok(events)
    }

    fn draw_cards(&mut self, seat: PlayerId, number: usize) -> Result<Vec<Scoped>, GameError> {
        if number == 0 {
            return Err(GameError::InvalidData("drawing zero cards".into()));
        }
        let deck_len = self.player(seat)?.zone("deck")?.cards.len();
        let count = number.min(deck_len);
        if count == 0 {
            return Err(GameError::OutOfContext("deck is empty".into()));
        }

        let mut fresh_ids = Vec::with_capacity(count);
        for _ in 0..count {
            fresh_ids.push(self.fresh_card_id());
        }

        let player = self.player_mut(seat)?;
        let mut drawn = Vec::with_capacity(count);
        for id in fresh_ids {
            let mut card = player.zone_mut("deck")?.take_at(0)?;
            card.id = id;
            drawn.push(card.to_info(true));
            player.zone_mut("hand")?.cards.push(card);
        }

        Ok(vec![Scoped::Redacted {
            owner: seat,
            full: GameEvent::DrawCards {
                player_id: seat,
                count,
                cards: drawn,
            },
            redacted: GameEvent::DrawCards {
                player_id: seat,
                count,
                cards: Vec::new(),
            },
        }])
    }

    fn move_cards(
        &mut self,
        seat: PlayerId,
        cards: &[CardToMove],
        start_zone: &str,
        target_zone: &str,
        x: i32,
        y: i32,
    ) -> Result<Vec<Scoped>, GameError> {
        if cards.is_empty() {
            return Err(GameError::InvalidData("no cards to move".into()));
        }

        // Validate everything before the first mutation.
        let player = self.player(seat)?;
        let start = player.zone(start_zone)?;
        let target = player.zone(target_zone)?;
        let (start_kind, start_hidden, start_coords) =
            (start.kind, start.is_hidden(), start.has_coords);
        let (target_kind, target_coords) = (target.kind, target.has_coords);

        let mut picks: Vec<(usize, bool)> = Vec::with_capacity(cards.len());
        for spec in cards {
            let position = if start_hidden {
                let position = usize::try_from(spec.card_id.0)
                    .map_err(|_| GameError::InvalidData("negative card position".into()))?;
                if position >= start.cards.len() {
                    return Err(GameError::CardNotFound {
                        zone: start_zone.to_owned(),
                    });
                }
                position
            } else {
                start.position_of(spec.card_id)?
            };
            if picks.iter().any(|(p, _)| *p == position) {
                return Err(GameError::OutOfContext("card listed twice".into()));
            }
            picks.push((position, spec.face_down));
        }
        // Highest position first, so earlier removals don't shift later
        // picks.
        picks.sort_by(|a, b| b.0.cmp(&a.0));

        let mut events = Vec::new();
        for (position, face_down) in picks {
            let mut card = self
                .player_mut(seat)?
                .zone_mut(start_zone)?
                .take_at(position)?;
            let old_ref = AttachRef {
                player_id: seat,
                zone: start_zone.to_owned(),
                card_id: card.id,
            };

            // Moving an attached card detaches it.
            if card.attached_to.take().is_some() {
                events.push(Scoped::Public(GameEvent::AttachCard {
                    player_id: seat,
                    start_zone: start_zone.to_owned(),
                    card_id: card.id,
                    target: None,
                }));
            }
            // Cards attached to it stay behind, detached.
            if start_zone != target_zone {
                events.extend(self.detach_all_from(&old_ref));
            }

            // Leaving a hidden zone severs identity tracking.
            if start_hidden {
                card.id = self.fresh_card_id();
            }
            // Leaving the table clears table-only state.
            if start_coords && !target_coords {
                card.tapped = false;
                card.counters.clear();
            }

            card.face_down = face_down && target_coords;
            let (event_x, event_y) = (x, y);
            if target_coords {
                card.x = x;
                card.y = y;
            }

            let card_id = card.id;
            let card_name = card.name.clone();
            let publicly_visible = !card.face_down
                && (start_kind == ZoneKind::Public || target_kind == ZoneKind::Public);

            let target_zone_owned = target_zone.to_owned();
            let player = self.player_mut(seat)?;
            if target_coords {
                player.zone_mut(target_zone)?.cards.push(card);
            } else {
                let index = usize::try_from(event_x.max(0)).unwrap_or(usize::MAX);
                player.zone_mut(target_zone)?.insert_at(index, card);
            }

            let full = GameEvent::MoveCard {
                player_id: seat,
                card_id,
                card_name: Some(card_name),
                start_zone: start_zone.to_owned(),
                position,
                target_zone: target_zone_owned.clone(),
                x: event_x,
                y: event_y,
                face_down,
            };
            if publicly_visible {
                events.push(Scoped::Public(full));
            } else {
                events.push(Scoped::Redacted {
                    owner: seat,
                    redacted: GameEvent::MoveCard {
                        player_id: seat,
                        card_id: CardId::HIDDEN,
                        card_name: None,
                        start_zone: start_zone.to_owned(),
                        position,
                        target_zone: target_zone_owned,
                        x: event_x,
                        y: event_y,
                        face_down,
                    },
                    full,
                });
            }
        }
        Ok(events)
    }

    fn create_token(
        &mut self,
        seat: PlayerId,
        zone: &str,
        name: &str,
        pt: &str,
        color: &str,
        x: i32,
        y: i32,
    ) -> Result<Vec<Scoped>, GameError> {
        if name.is_empty() {
            return Err(GameError::InvalidData("token without a name".into()));
        }
        let id = self.fresh_card_id();
        let target = self.player_mut(seat)?.zone_mut(zone)?;
        if !target.has_coords {
            return Err(GameError::OutOfContext("tokens live on the table".into()));
        }
        let mut card = Card::new(id, name);
        card.pt = pt.to_owned();
        card.color = color.to_owned();
        card.x = x;
        card.y = y;
        let info = card.to_info(true);
        target.cards.push(card);
        Ok(vec![Scoped::Public(GameEvent::CreateToken {
            player_id: seat,
            zone: zone.to_owned(),
            card: info,
        })])
    }

    fn attach_card(
        &mut self,
        seat: PlayerId,
        start_zone: &str,
        card_id: CardId,
        target_player_id: PlayerId,
        target_zone: &str,
        target_card_id: CardId,
    ) -> Result<Vec<Scoped>, GameError> {
        if seat == target_player_id && start_zone == target_zone && card_id == target_card_id {
            return Err(GameError::OutOfContext("cannot attach a card to itself".into()));
        }
        {
            let own = self.player(seat)?.zone(start_zone)?;
            if !own.has_coords {
                return Err(GameError::OutOfContext("attachments live on the table".into()));
            }
            own.card(card_id)?;
        }
        {
            let target_player = self
                .players
                .get(&target_player_id)
                .ok_or(GameError::PlayerNotFound(target_player_id.0))?;
            let target = target_player.zone(target_zone)?;
            if !target.has_coords {
                return Err(GameError::OutOfContext("attachments live on the table".into()));
            }
            target.card(target_card_id)?;
        }

        let attach_ref = AttachRef {
            player_id: target_player_id,
            zone: target_zone.to_owned(),
            card_id: target_card_id,
        };
        let card = self.player_mut(seat)?.zone_mut(start_zone)?.card_mut(card_id)?;
        card.attached_to = Some(attach_ref.clone());
        Ok(vec![Scoped::Public(GameEvent::AttachCard {
            player_id: seat,
            start_zone: start_zone.to_owned(),
            card_id,
            target: Some(attach_ref),
        })])
    }

    fn dump_zone(
        &mut self,
        seat: PlayerId,
        zone_owner: PlayerId,
        zone_name: &str,
        number_cards: i32,
    ) -> Result<Vec<Scoped>, GameError> {
        let owner = self
            .players
            .get(&zone_owner)
            .ok_or(GameError::PlayerNotFound(zone_owner.0))?;
        let zone = owner.zone(zone_name)?;
        if zone.kind != ZoneKind::Public && seat != zone_owner {
            return Err(GameError::NotAllowed(
                "only the owner may look into that zone".into(),
            ));
        }
        let count = if number_cards < 0 {
            zone.cards.len()
        } else {
            (number_cards as usize).min(zone.cards.len())
        };
        let revealed = ZoneInfo {
            name: zone.name.clone(),
            kind: zone.kind,
            has_coords: zone.has_coords,
            card_count: zone.cards.len(),
            cards: zone.cards.iter().take(count).map(|c| c.to_info(true)).collect(),
        };
        let base = GameEvent::DumpZone {
            player_id: seat,
            zone_owner,
            zone: zone_name.to_owned(),
            number_cards,
            revealed: None,
        };
        let full = GameEvent::DumpZone {
            player_id: seat,
            zone_owner,
            zone: zone_name.to_owned(),
            number_cards,
            revealed: Some(revealed),
        };
        Ok(vec![Scoped::Redacted {
            owner: seat,
            full,
            redacted: base,
        }])
    }

    // -----------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------

    fn player(&self, seat: PlayerId) -> Result<&Player, GameError> {
        self.players
            .get(&seat)
            .ok_or(GameError::NotInGame(self.game_id))
    }

    fn player_mut(&mut self, seat: PlayerId) -> Result<&mut Player, GameError> {
        self.players
            .get_mut(&seat)
            .ok_or(GameError::NotInGame(self.game_id))
    }

    fn fresh_card_id(&mut self) -> CardId {
        let id = CardId(self.next_card_id);
        self.next_card_id += 1;
        id
    }

    /// Clears every attachment pointing at `target`, emitting one
    /// detach event per cleared card.
    fn detach_all_from(&mut self, target: &AttachRef) -> Vec<Scoped> {
        let mut events = Vec::new();
        for player in self.players.values_mut() {
            for zone in &mut player.zones {
                for card in &mut zone.cards {
                    if card.attached_to.as_ref() == Some(target) {
                        card.attached_to = None;
                        events.push(Scoped::Public(GameEvent::AttachCard {
                            player_id: player.player_id,
                            start_zone: zone.name.clone(),
                            card_id: card.id,
                            target: None,
                        }));
                    }
                }
            }
        }
        events
    }

    /// Hands the turn to the next non-conceded player after the one
    /// currently active (or after `from` when nobody is active).
    fn advance_turn(&mut self, from: PlayerId) -> Vec<Scoped> {
        let current = self.active_player.unwrap_or(from);
        let seats: Vec<PlayerId> = self
            .players
            .values()
            .filter(|p| !p.spectator && !p.conceded)
            .map(|p| p.player_id)
            .collect();
        if seats.is_empty() {
            self.active_player = None;
            return Vec::new();
        }
        let next = seats
            .iter()
            .copied()
            .find(|&s| s > current)
            .unwrap_or(seats[0]);
        self.active_player = Some(next);
        vec![Scoped::Public(GameEvent::SetActivePlayer {
            player_id: from,
            active_player: next,
        })]
    }
}
