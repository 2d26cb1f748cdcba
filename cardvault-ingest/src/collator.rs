//! Multi-face card collation
//!
//! Multi-faced cards arrive as consecutive flat records, one per face, all
//! sharing the same (set code, number). The collator buffers them until the
//! expected number of faces is present and then releases one aggregate card.

use crate::models::{Card, CardKey};
use std::collections::HashMap;
use tracing::trace;

/// Separator between face names in a multi-face card name
pub const FACE_NAME_SEPARATOR: &str = " // ";

/// Result of pushing one fragment
#[derive(Debug, Clone, PartialEq)]
pub enum Collation {
    /// More faces are still expected for this card
    Incomplete,
    /// All faces arrived; the aggregate card is released
    Complete(Card),
}

/// Number of faces a card is expected to have
///
/// Meld cards name both halves of the melded result but each printing is a
/// single face.
pub fn expected_face_count(name: &str, layout: &str) -> usize {
    if layout.eq_ignore_ascii_case("MELD") {
        return 1;
    }
    name.split(FACE_NAME_SEPARATOR).count().max(1)
}

/// Buffer of incomplete multi-face cards
#[derive(Debug, Default)]
pub struct FaceCollator {
    pending: HashMap<CardKey, Card>,
}

impl FaceCollator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fragment; faces are appended in arrival order
    pub fn push(&mut self, expected_faces: usize, card: Card) -> Collation {
        let key = card.key();

        let collected = match self.pending.remove(&key) {
            Some(mut buffered) => {
                buffered.faces.extend(card.faces);
                buffered
            }
            None => card,
        };

        if collected.faces.len() >= expected_faces {
            trace!(card = %key, faces = collected.faces.len(), "Collated multi-face card");
            return Collation::Complete(collected);
        }

        trace!(
            card = %key,
            faces = collected.faces.len(),
            expected = expected_faces,
            "Waiting for more faces"
        );
        self.pending.insert(key, collected);
        Collation::Incomplete
    }

    /// Keys of cards still waiting for faces, sorted
    pub fn pending_keys(&self) -> Vec<CardKey> {
        let mut keys: Vec<CardKey> = self.pending.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Face;

    fn fragment(number: &str, card_name: &str, face_name: &str) -> Card {
        Card {
            set_code: "ISD".to_string(),
            number: number.to_string(),
            name: card_name.to_string(),
            rarity: "COMMON".to_string(),
            border: "BLACK".to_string(),
            layout: "TRANSFORM".to_string(),
            faces: vec![Face {
                name: face_name.to_string(),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_expected_face_count() {
        assert_eq!(expected_face_count("Grizzly Bears", "NORMAL"), 1);
        assert_eq!(expected_face_count("Fire // Ice", "SPLIT"), 2);
        assert_eq!(expected_face_count("Who // What // When // Where // Why", "SPLIT"), 5);
        assert_eq!(expected_face_count("Bruna // Gisela", "MELD"), 1);
        assert_eq!(expected_face_count("", "NORMAL"), 1);
    }

    #[test]
    fn test_three_fragments_make_one_card() {
        let name = "A // B // C";
        let mut collator = FaceCollator::new();

        assert_eq!(collator.push(3, fragment("7", name, "A")), Collation::Incomplete);
        assert_eq!(collator.push(3, fragment("7", name, "B")), Collation::Incomplete);

        match collator.push(3, fragment("7", name, "C")) {
            Collation::Complete(card) => {
                let faces: Vec<&str> = card.faces.iter().map(|f| f.name.as_str()).collect();
                assert_eq!(faces, vec!["A", "B", "C"]);
            }
            Collation::Incomplete => panic!("card should be complete"),
        }
        assert!(collator.is_empty());
    }

    #[test]
    fn test_incomplete_cards_are_reported() {
        let mut collator = FaceCollator::new();
        collator.push(3, fragment("9", "A // B // C", "A"));
        collator.push(3, fragment("9", "A // B // C", "B"));
        collator.push(2, fragment("2", "X // Y", "X"));

        let keys: Vec<String> = collator.pending_keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["ISD#2", "ISD#9"]);
    }

    #[test]
    fn test_different_numbers_do_not_mix() {
        let mut collator = FaceCollator::new();
        collator.push(2, fragment("1", "X // Y", "X"));
        collator.push(2, fragment("2", "X // Y", "X"));

        assert_eq!(collator.pending_keys().len(), 2);
        assert!(matches!(
            collator.push(2, fragment("1", "X // Y", "Y")),
            Collation::Complete(card) if card.number == "1" && card.faces.len() == 2
        ));
    }
}
