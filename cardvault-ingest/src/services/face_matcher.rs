//! Incoming ↔ persisted face matching
//!
//! Two passes over the incoming faces:
//! 1. exact match on (name, text, flavor text)
//! 2. name-only match among the persisted faces still unclaimed
//!
//! Each persisted face is claimed at most once. Unclaimed persisted faces are
//! the ones to delete.

use crate::db::FaceRow;
use crate::models::Face;

/// Result of matching one card's faces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceMatches {
    /// For each incoming face, the index of its persisted counterpart
    pub incoming: Vec<Option<usize>>,
    /// Indexes of persisted faces no incoming face claimed
    pub orphaned: Vec<usize>,
}

pub fn match_faces(existing: &[FaceRow], incoming: &[Face]) -> FaceMatches {
    let mut claimed = vec![false; existing.len()];
    let mut matches = vec![None; incoming.len()];

    let mut claim = |matches: &mut Vec<Option<usize>>, predicate: &dyn Fn(&FaceRow, &Face) -> bool| {
        for (i, face) in incoming.iter().enumerate() {
            if matches[i].is_some() {
                continue;
            }
            let found = existing
                .iter()
                .enumerate()
                .find(|(j, row)| !claimed[*j] && predicate(row, face))
                .map(|(j, _)| j);
            if let Some(j) = found {
                claimed[j] = true;
                matches[i] = Some(j);
            }
        }
    };

    claim(&mut matches, &|row, face| {
        row.name == face.name && row.text == face.text && row.flavor_text == face.flavor_text
    });
    claim(&mut matches, &|row, face| row.name == face.name);

    let orphaned = claimed
        .iter()
        .enumerate()
        .filter(|(_, taken)| !**taken)
        .map(|(j, _)| j)
        .collect();

    FaceMatches {
        incoming: matches,
        orphaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, name: &str, text: &str) -> FaceRow {
        FaceRow {
            id,
            card_id: 1,
            position: id,
            name: name.to_string(),
            text: text.to_string(),
            flavor_text: String::new(),
            type_line: String::new(),
            multiverse_id: 0,
            artist: String::new(),
            converted_mana_cost: 0.0,
            colors: Vec::new(),
            hand_modifier: None,
            life_modifier: None,
            loyalty: None,
            mana_cost: None,
            power: None,
            toughness: None,
        }
    }

    fn face(name: &str, text: &str) -> Face {
        Face {
            name: name.to_string(),
            text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_name_fallback_when_text_changed() {
        let matches = match_faces(&[row(1, "A", "old")], &[face("A", "new")]);

        assert_eq!(matches.incoming, vec![Some(0)]);
        assert!(matches.orphaned.is_empty());
    }

    #[test]
    fn test_exact_match_wins_over_earlier_name_match() {
        let existing = [row(1, "A", "first"), row(2, "A", "second")];
        let matches = match_faces(&existing, &[face("A", "second"), face("A", "other")]);

        assert_eq!(matches.incoming, vec![Some(1), Some(0)]);
    }

    #[test]
    fn test_unmatched_faces_on_both_sides() {
        let existing = [row(1, "Fire", ""), row(2, "Ice", "")];
        let matches = match_faces(&existing, &[face("Fire", ""), face("Water", "")]);

        assert_eq!(matches.incoming, vec![Some(0), None]);
        assert_eq!(matches.orphaned, vec![1]);
    }

    #[test]
    fn test_each_persisted_face_claimed_once() {
        let matches = match_faces(&[row(1, "A", "")], &[face("A", ""), face("A", "")]);

        assert_eq!(matches.incoming, vec![Some(0), None]);
    }
}
