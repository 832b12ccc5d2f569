//! Per-observer event scoping.
//!
//! Game mutations are described once, at the point where the game still
//! knows who may see what. Each emitted event is either public or comes
//! in two prebuilt renditions: the full one for the acting owner (and
//! omniscient observers), the redacted one for everyone else. Delivery
//! then only has to pick, never to reconstruct.

use cardforge_protocol::{GameEvent, PlayerId};

/// How one observer relates to a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observer {
    /// The observer's seat.
    pub seat: PlayerId,

    /// Sees everything: the seat's own view of itself, or a spectator
    /// in a game with `spectators_see_everything`.
    pub omniscient: bool,
}

/// One game event with its visibility decision attached.
#[derive(Debug, Clone)]
pub enum Scoped {
    /// Delivered identically to every participant.
    Public(GameEvent),

    /// Full rendition for `owner` and omniscient observers, redacted
    /// rendition for the rest.
    Redacted {
        owner: PlayerId,
        full: GameEvent,
        redacted: GameEvent,
    },
}

impl Scoped {
    /// The rendition this observer receives.
    pub fn for_observer(&self, observer: &Observer) -> GameEvent {
        match self {
            Self::Public(event) => event.clone(),
            Self::Redacted { owner, full, redacted } => {
                if observer.seat == *owner || observer.omniscient {
                    full.clone()
                } else {
                    redacted.clone()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardforge_protocol::CardId;

    #[test]
    fn test_public_events_are_identical_for_all() {
        let scoped = Scoped::Public(GameEvent::Concede { player_id: PlayerId(0) });
        let a = scoped.for_observer(&Observer { seat: PlayerId(0), omniscient: false });
        let b = scoped.for_observer(&Observer { seat: PlayerId(1), omniscient: false });
        assert_eq!(a, b);
    }

    #[test]
    fn test_redacted_events_pick_by_owner_and_omniscience() {
        let full = GameEvent::DrawCards {
            player_id: PlayerId(0),
            count: 1,
            cards: vec![],
        };
        let redacted = GameEvent::MoveCard {
            player_id: PlayerId(0),
            card_id: CardId::HIDDEN,
            card_name: None,
            start_zone: "deck".into(),
            position: 0,
            target_zone: "hand".into(),
            x: 0,
            y: 0,
            face_down: false,
        };
        let scoped = Scoped::Redacted {
            owner: PlayerId(0),
            full: full.clone(),
            redacted: redacted.clone(),
        };

        let owner = Observer { seat: PlayerId(0), omniscient: false };
        let other = Observer { seat: PlayerId(1), omniscient: false };
        let watcher = Observer { seat: PlayerId(2), omniscient: true };
        assert_eq!(scoped.for_observer(&owner), full);
        assert_eq!(scoped.for_observer(&other), redacted);
        assert_eq!(scoped.for_observer(&watcher), full);
    }
}
