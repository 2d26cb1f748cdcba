//! Raw fragment records as they appear in the source document
//!
//! Field names follow the document (camelCase). Everything is optional here;
//! required-field checks belong to the mapper.

use serde::Deserialize;
use std::fmt;

/// A JSON scalar that may be delivered as a string or a number
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Integer(n) => write!(f, "{}", n),
            Scalar::Float(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

/// Aggregated set-level fields, emitted after the set's cards
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSet {
    /// Key of the set object inside `data`
    pub key: String,
    pub code: Option<String>,
    pub name: Option<String>,
    pub block: Option<String>,
    /// `None` when the field was absent, `Some("")` when present but blank
    pub set_type: Option<String>,
    pub total_set_size: Option<i64>,
    pub release_date: Option<String>,
    /// (language, localized name), blank entries already dropped
    pub translations: Vec<(String, String)>,
    /// Card fragments emitted for this set
    pub card_count: usize,
}

impl RawSet {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }
}

/// One flat card record (one face of a multi-face card)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawCard {
    pub name: Option<String>,
    pub set_code: Option<String>,
    pub number: Option<Scalar>,
    pub rarity: Option<String>,
    #[serde(rename = "type")]
    pub type_line: Option<String>,
    pub border_color: Option<String>,
    pub layout: Option<String>,
    pub mana_cost: Option<String>,
    pub converted_mana_cost: Option<f64>,
    pub face_name: Option<String>,
    pub face_converted_mana_cost: Option<f64>,
    pub text: Option<String>,
    pub flavor_text: Option<String>,
    pub artist: Option<String>,
    pub power: Option<String>,
    pub toughness: Option<String>,
    pub loyalty: Option<Scalar>,
    pub hand: Option<Scalar>,
    pub life: Option<Scalar>,
    pub colors: Option<Vec<String>>,
    pub types: Option<Vec<String>>,
    pub supertypes: Option<Vec<String>>,
    pub subtypes: Option<Vec<String>>,
    pub identifiers: Option<RawIdentifiers>,
    pub foreign_data: Option<Vec<RawForeignData>>,
}

/// External identifiers of a card
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawIdentifiers {
    pub multiverse_id: Option<Scalar>,
}

/// Localized printing of a card face
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawForeignData {
    pub language: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub flavor_text: Option<String>,
    #[serde(rename = "type")]
    pub type_line: Option<String>,
    pub multiverse_id: Option<Scalar>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_card_deserializes_document_fields() {
        let json = r#"{
            "name": "Delver of Secrets // Insectile Aberration",
            "faceName": "Delver of Secrets",
            "setCode": "ISD",
            "number": "51",
            "rarity": "common",
            "type": "Creature — Human Wizard",
            "borderColor": "black",
            "layout": "transform",
            "convertedManaCost": 1.0,
            "colors": ["U"],
            "types": ["Creature"],
            "subtypes": ["Human", "Wizard"],
            "identifiers": {"multiverseId": "226749", "scryfallId": "x"},
            "foreignData": [{"language": "German", "name": "Delver", "multiverseId": 227290}],
            "unknownField": {"nested": [1, 2, 3]}
        }"#;

        let card: RawCard = serde_json::from_str(json).unwrap();
        assert_eq!(card.face_name.as_deref(), Some("Delver of Secrets"));
        assert_eq!(card.number, Some(Scalar::Text("51".to_string())));
        assert_eq!(card.type_line.as_deref(), Some("Creature — Human Wizard"));
        assert_eq!(card.subtypes.unwrap(), vec!["Human", "Wizard"]);
        assert_eq!(
            card.identifiers.unwrap().multiverse_id,
            Some(Scalar::Text("226749".to_string()))
        );
        assert_eq!(
            card.foreign_data.unwrap()[0].multiverse_id,
            Some(Scalar::Integer(227290))
        );
    }

    #[test]
    fn test_nulls_deserialize_as_none() {
        let card: RawCard = serde_json::from_str(r#"{"name": null, "colors": null}"#).unwrap();
        assert!(card.name.is_none());
        assert!(card.colors.is_none());
    }
}
