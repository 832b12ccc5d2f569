//! A single card and its mutable attributes.

use cardforge_protocol::{AttachRef, CardAttr, CardCounter, CardId, CardInfo};

use crate::GameError;

/// One card inside a zone. The authoritative record; what a given
/// observer sees of it is decided at event/snapshot time.
#[derive(Debug, Clone)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub face_down: bool,
    pub tapped: bool,
    pub annotation: String,
    pub pt: String,
    pub color: String,
    pub counters: Vec<CardCounter>,
    pub attached_to: Option<AttachRef>,
}

impl Card {
    pub fn new(id: CardId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            x: 0,
            y: 0,
            face_down: false,
            tapped: false,
            annotation: String::new(),
            pt: String::new(),
            color: String::new(),
            counters: Vec::new(),
            attached_to: None,
        }
    }

    /// Applies one attribute change.
    ///
    /// # Errors
    /// [`GameError::InvalidData`] when a boolean attribute gets a
    /// non-boolean value.
    pub fn set_attr(&mut self, attr: CardAttr, value: &str) -> Result<(), GameError> {
        match attr {
            CardAttr::Tapped => self.tapped = parse_bool(value)?,
            CardAttr::FaceDown => self.face_down = parse_bool(value)?,
            CardAttr::Annotation => self.annotation = value.to_owned(),
            CardAttr::Pt => self.pt = value.to_owned(),
            CardAttr::Color => self.color = value.to_owned(),
        }
        Ok(())
    }

    /// The card as one observer sees it. When `visible` is false the id
    /// is anonymized and the identifying fields are blanked; position
    /// and tapped state stay, they are observable at the table.
    pub fn to_info(&self, visible: bool) -> CardInfo {
        if visible {
            CardInfo {
                id: self.id,
                name: self.name.clone(),
                x: self.x,
                y: self.y,
                face_down: self.face_down,
                tapped: self.tapped,
                annotation: self.annotation.clone(),
                pt: self.pt.clone(),
                color: self.color.clone(),
                counters: self.counters.clone(),
                attached_to: self.attached_to.clone(),
            }
        } else {
            CardInfo {
                id: CardId::HIDDEN,
                name: String::new(),
                x: self.x,
                y: self.y,
                face_down: self.face_down,
                tapped: self.tapped,
                annotation: String::new(),
                pt: String::new(),
                color: String::new(),
                counters: Vec::new(),
                attached_to: self.attached_to.clone(),
            }
        }
    }
}

fn parse_bool(value: &str) -> Result<bool, GameError> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(GameError::InvalidData(format!("not a boolean: {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_attr_tapped_parses_booleans() {
        let mut card = Card::new(CardId(1), "Bear");
        card.set_attr(CardAttr::Tapped, "true").unwrap();
        assert!(card.tapped);
        card.set_attr(CardAttr::Tapped, "0").unwrap();
        assert!(!card.tapped);
        assert!(card.set_attr(CardAttr::FaceDown, "sideways").is_err());
    }

    #[test]
    fn test_set_attr_strings() {
        let mut card = Card::new(CardId(1), "Bear");
        card.set_attr(CardAttr::Pt, "4/4").unwrap();
        card.set_attr(CardAttr::Annotation, "token").unwrap();
        assert_eq!(card.pt, "4/4");
        assert_eq!(card.annotation, "token");
    }

    #[test]
    fn test_hidden_info_is_anonymized() {
        let mut card = Card::new(CardId(9), "Secret Plan");
        card.pt = "1/1".into();
        let info = card.to_info(false);
        assert_eq!(info.id, CardId::HIDDEN);
        assert!(info.name.is_empty());
        assert!(info.pt.is_empty());
        let full = card.to_info(true);
        assert_eq!(full.id, CardId(9));
        assert_eq!(full.name, "Secret Plan");
    }
}
