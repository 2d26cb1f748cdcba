//! Catalog domain entities
//!
//! These are the validated, normalized shapes produced by the mapper and
//! consumed by the reconciliation engine.

use chrono::NaiveDate;
use std::fmt;

/// Natural key of a card: (set code, collector number)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CardKey {
    pub set_code: String,
    pub number: String,
}

impl fmt::Display for CardKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.set_code, self.number)
    }
}

/// A card set (expansion)
#[derive(Debug, Clone, PartialEq)]
pub struct CardSet {
    pub code: String,
    pub name: String,
    pub set_type: String,
    pub total_set_size: i64,
    /// `0001-01-01` when the source date was blank or invalid
    pub release_date: NaiveDate,
    pub block: Option<String>,
    pub translations: Vec<SetTranslation>,
}

/// Localized set name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetTranslation {
    pub language: String,
    pub name: String,
}

/// A card with its ordered faces
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub set_code: String,
    pub number: String,
    pub name: String,
    pub rarity: String,
    pub border: String,
    pub layout: String,
    pub faces: Vec<Face>,
}

impl Card {
    pub fn key(&self) -> CardKey {
        CardKey {
            set_code: self.set_code.clone(),
            number: self.number.clone(),
        }
    }
}

/// One side of a card
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Face {
    pub name: String,
    pub text: String,
    pub flavor_text: String,
    pub type_line: String,
    pub multiverse_id: i64,
    pub artist: String,
    pub converted_mana_cost: f64,
    /// Upper-cased color symbols in source order
    pub colors: Vec<String>,
    pub hand_modifier: Option<String>,
    pub life_modifier: Option<String>,
    pub loyalty: Option<String>,
    pub mana_cost: Option<String>,
    pub power: Option<String>,
    pub toughness: Option<String>,
    pub card_types: Vec<String>,
    pub super_types: Vec<String>,
    pub sub_types: Vec<String>,
    pub translations: Vec<FaceTranslation>,
}

impl Face {
    /// Type names of one dictionary kind
    pub fn types(&self, kind: CharacteristicKind) -> &[String] {
        match kind {
            CharacteristicKind::CardType => &self.card_types,
            CharacteristicKind::SuperType => &self.super_types,
            CharacteristicKind::SubType => &self.sub_types,
        }
    }
}

/// Localized face text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FaceTranslation {
    pub language: String,
    pub name: String,
    pub text: String,
    pub flavor_text: String,
    pub type_line: String,
    pub multiverse_id: i64,
}

/// The three independent characteristic-type dictionaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacteristicKind {
    CardType,
    SuperType,
    SubType,
}

impl CharacteristicKind {
    pub const ALL: [CharacteristicKind; 3] = [
        CharacteristicKind::CardType,
        CharacteristicKind::SuperType,
        CharacteristicKind::SubType,
    ];

    /// Dictionary table holding (id, name)
    pub fn dictionary_table(self) -> &'static str {
        match self {
            CharacteristicKind::CardType => "card_types",
            CharacteristicKind::SuperType => "super_types",
            CharacteristicKind::SubType => "sub_types",
        }
    }

    /// Join table holding (face_id, type_id)
    pub fn assignment_table(self) -> &'static str {
        match self {
            CharacteristicKind::CardType => "face_card_types",
            CharacteristicKind::SuperType => "face_super_types",
            CharacteristicKind::SubType => "face_sub_types",
        }
    }
}

impl fmt::Display for CharacteristicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CharacteristicKind::CardType => "card type",
            CharacteristicKind::SuperType => "super type",
            CharacteristicKind::SubType => "sub type",
        };
        f.write_str(label)
    }
}
