//! Zones: ordered card containers with a visibility policy.

use cardforge_protocol::{CardId, ZoneInfo, ZoneKind};
use rand::seq::SliceRandom;

use crate::{Card, GameError};

/// One zone owned by one player. Cards are kept in list order; for the
/// table the order is irrelevant and coordinates matter instead.
#[derive(Debug, Clone)]
pub struct Zone {
    pub name: String,
    pub kind: ZoneKind,
    pub has_coords: bool,
    pub cards: Vec<Card>,
}

impl Zone {
    pub fn new(name: impl Into<String>, kind: ZoneKind, has_coords: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            has_coords,
            cards: Vec::new(),
        }
    }

    /// The fixed zone set every player gets.
    pub fn standard_set() -> Vec<Zone> {
        vec![
            Zone::new("hand", ZoneKind::Private, false),
            Zone::new("deck", ZoneKind::Hidden, false),
            Zone::new("grave", ZoneKind::Public, false),
            Zone::new("rfg", ZoneKind::Public, false),
            Zone::new("sb", ZoneKind::Hidden, false),
            Zone::new("table", ZoneKind::Public, true),
        ]
    }

    pub fn is_hidden(&self) -> bool {
        self.kind == ZoneKind::Hidden
    }

    /// Whether an observer may see card identities here. `owner` means
    /// the observer owns the zone; `omniscient` means the observer sees
    /// everything (own view, or spectator with the right game setting).
    pub fn contents_visible_to(&self, owner: bool, omniscient: bool) -> bool {
        match self.kind {
            ZoneKind::Public => true,
            ZoneKind::Private => owner || omniscient,
            ZoneKind::Hidden => false,
        }
    }

    /// Index of a card by stable id.
    pub fn position_of(&self, card_id: CardId) -> Result<usize, GameError> {
        self.cards
            .iter()
            .position(|c| c.id == card_id)
            .ok_or_else(|| GameError::CardNotFound {
                zone: self.name.clone(),
            })
    }

    pub fn card(&self, card_id: CardId) -> Result<&Card, GameError> {
        let pos = self.position_of(card_id)?;
        Ok(&self.cards[pos])
    }

    pub fn card_mut(&mut self, card_id: CardId) -> Result<&mut Card, GameError> {
        let pos = self.position_of(card_id)?;
        Ok(&mut self.cards[pos])
    }

    /// Removes the card at a list position.
    pub fn take_at(&mut self, position: usize) -> Result<Card, GameError> {
        if position >= self.cards.len() {
            return Err(GameError::CardNotFound {
                zone: self.name.clone(),
            });
        }
        Ok(self.cards.remove(position))
    }

    /// Inserts a card at a list position, clamped to the zone's length.
    pub fn insert_at(&mut self, position: usize, card: Card) {
        let position = position.min(self.cards.len());
        self.cards.insert(position, card);
    }

    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rand::rng());
    }

    /// The zone as one observer sees it. `card_count` is always real;
    /// `cards` is present only when the observer may see contents.
    pub fn to_info(&self, owner: bool, omniscient: bool) -> ZoneInfo {
        let visible = self.contents_visible_to(owner, omniscient);
        ZoneInfo {
            name: self.name.clone(),
            kind: self.kind,
            has_coords: self.has_coords,
            card_count: self.cards.len(),
            cards: if visible {
                self.cards.iter().map(|c| c.to_info(true)).collect()
            } else {
                Vec::new()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone_with_cards(kind: ZoneKind, names: &[&str]) -> Zone {
        let mut zone = Zone::new("z", kind, false);
        for (i, name) in names.iter().enumerate() {
            zone.cards.push(Card::new(CardId(i as i64 + 1), *name));
        }
        zone
    }

    #[test]
    fn test_standard_set_layout() {
        let zones = Zone::standard_set();
        let names: Vec<&str> = zones.iter().map(|z| z.name.as_str()).collect();
        assert_eq!(names, ["hand", "deck", "grave", "rfg", "sb", "table"]);
        assert!(zones.iter().find(|z| z.name == "table").unwrap().has_coords);
        assert!(zones.iter().find(|z| z.name == "deck").unwrap().is_hidden());
    }

    #[test]
    fn test_visibility_per_kind() {
        let private = Zone::new("hand", ZoneKind::Private, false);
        assert!(private.contents_visible_to(true, false));
        assert!(private.contents_visible_to(false, true));
        assert!(!private.contents_visible_to(false, false));

        let hidden = Zone::new("deck", ZoneKind::Hidden, false);
        assert!(!hidden.contents_visible_to(true, true));

        let public = Zone::new("grave", ZoneKind::Public, false);
        assert!(public.contents_visible_to(false, false));
    }

    #[test]
    fn test_take_and_insert_positions() {
        let mut zone = zone_with_cards(ZoneKind::Public, &["a", "b", "c"]);
        let card = zone.take_at(1).unwrap();
        assert_eq!(card.name, "b");
        zone.insert_at(99, card); // clamps to the end
        assert_eq!(zone.cards.last().unwrap().name, "b");
        assert!(zone.take_at(99).is_err());
    }

    #[test]
    fn test_hidden_zone_info_has_count_but_no_cards() {
        let zone = zone_with_cards(ZoneKind::Hidden, &["a", "b"]);
        let info = zone.to_info(true, true);
        assert_eq!(info.card_count, 2);
        assert!(info.cards.is_empty());
    }
}
