//! Raw fragment → domain entity mapping
//!
//! Pure functions. Strings are trimmed, enumerated values upper-cased,
//! languages mapped to internal codes, numbers coerced, and required fields
//! validated. Nothing here touches storage.

pub mod language;

pub use language::language_code;

use crate::error::{ImportError, ImportResult};
use crate::models::{Card, CardSet, Face, FaceTranslation, SetTranslation};
use crate::parser::{RawCard, RawForeignData, RawSet, Scalar};
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::trace;

/// Set type used when the source omits the field
pub const UNKNOWN_SET_TYPE: &str = "UNKNOWN";

/// Release date stored when the source date is blank or invalid
pub fn unknown_release_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap_or_default()
}

/// Map a set fragment
pub fn map_set(raw: RawSet) -> ImportResult<CardSet> {
    let code = non_blank(raw.code.as_deref())
        .or_else(|| non_blank(Some(&raw.key)))
        .ok_or_else(|| ImportError::validation(format!("set {}", raw.key), "code is required"))?;
    let entity = format!("set {}", code);

    let set_type = match raw.set_type.as_deref() {
        None => UNKNOWN_SET_TYPE.to_string(),
        Some(value) => non_blank(Some(value))
            .map(|t| t.to_uppercase())
            .ok_or_else(|| ImportError::validation(&entity, "type must not be blank"))?,
    };

    let mut seen = HashSet::new();
    let translations = raw
        .translations
        .iter()
        .filter_map(|(language, name)| {
            let Some(internal) = language_code(language) else {
                trace!(set_code = %code, language = %language, "Dropping unmapped set translation language");
                return None;
            };
            let name = non_blank(Some(name))?;
            seen.insert(internal).then(|| SetTranslation {
                language: internal.to_string(),
                name,
            })
        })
        .collect();

    Ok(CardSet {
        name: trimmed(raw.name.as_deref()),
        set_type,
        total_set_size: raw.total_set_size.unwrap_or(0),
        release_date: parse_release_date(raw.release_date.as_deref()),
        block: non_blank(raw.block.as_deref()),
        translations,
        code,
    })
}

/// Map one card fragment into a card with exactly one face
pub fn map_card(raw: RawCard) -> ImportResult<Card> {
    let number = raw
        .number
        .as_ref()
        .and_then(|n| non_blank(Some(&n.to_string())));
    let entity = format!(
        "card {}#{}",
        raw.set_code.as_deref().unwrap_or("?").trim(),
        number.as_deref().unwrap_or("?")
    );

    let required = |value: Option<&str>, field: &str| {
        non_blank(value).ok_or_else(|| ImportError::validation(&entity, format!("{} is required", field)))
    };

    let set_code = required(raw.set_code.as_deref(), "setCode")?;
    let number = required(number.as_deref(), "number")?;
    let name = required(raw.name.as_deref(), "name")?;
    let rarity = required(raw.rarity.as_deref(), "rarity")?.to_uppercase();
    let border = required(raw.border_color.as_deref(), "borderColor")?.to_uppercase();
    let layout = required(raw.layout.as_deref(), "layout")?.to_uppercase();

    let face = map_face(&entity, &raw)?;

    Ok(Card {
        set_code,
        number,
        name,
        rarity,
        border,
        layout,
        faces: vec![face],
    })
}

fn map_face(entity: &str, raw: &RawCard) -> ImportResult<Face> {
    let name = non_blank(raw.face_name.as_deref())
        .or_else(|| non_blank(raw.name.as_deref()))
        .ok_or_else(|| ImportError::validation(entity, "face name is required"))?;

    let multiverse_id = match raw.identifiers.as_ref().and_then(|ids| ids.multiverse_id.as_ref()) {
        Some(value) => coerce_id(entity, "multiverseId", value)?,
        None => 0,
    };

    let colors = raw
        .colors
        .iter()
        .flatten()
        .filter_map(|c| non_blank(Some(c)))
        .map(|c| c.to_uppercase())
        .collect();

    let mut translations = Vec::new();
    let mut seen = HashSet::new();
    for foreign in raw.foreign_data.iter().flatten() {
        if let Some(translation) = map_face_translation(entity, foreign)? {
            if seen.insert(translation.language.clone()) {
                translations.push(translation);
            }
        }
    }

    Ok(Face {
        name,
        text: trimmed(raw.text.as_deref()),
        flavor_text: trimmed(raw.flavor_text.as_deref()),
        type_line: trimmed(raw.type_line.as_deref()),
        multiverse_id,
        artist: trimmed(raw.artist.as_deref()),
        converted_mana_cost: raw
            .face_converted_mana_cost
            .or(raw.converted_mana_cost)
            .unwrap_or(0.0),
        colors,
        hand_modifier: scalar_text(raw.hand.as_ref()),
        life_modifier: scalar_text(raw.life.as_ref()),
        loyalty: scalar_text(raw.loyalty.as_ref()),
        mana_cost: non_blank(raw.mana_cost.as_deref()),
        power: non_blank(raw.power.as_deref()),
        toughness: non_blank(raw.toughness.as_deref()),
        card_types: type_names(raw.types.as_deref()),
        super_types: type_names(raw.supertypes.as_deref()),
        sub_types: type_names(raw.subtypes.as_deref()),
        translations,
    })
}

fn map_face_translation(entity: &str, raw: &RawForeignData) -> ImportResult<Option<FaceTranslation>> {
    let Some(language) = raw.language.as_deref().and_then(language_code) else {
        trace!(entity, language = ?raw.language, "Dropping unmapped face translation language");
        return Ok(None);
    };

    let multiverse_id = match raw.multiverse_id.as_ref() {
        Some(value) => coerce_id(entity, "foreignData.multiverseId", value)?,
        None => 0,
    };

    Ok(Some(FaceTranslation {
        language: language.to_string(),
        name: trimmed(raw.name.as_deref()),
        text: trimmed(raw.text.as_deref()),
        flavor_text: trimmed(raw.flavor_text.as_deref()),
        type_line: trimmed(raw.type_line.as_deref()),
        multiverse_id,
    }))
}

/// `%Y-%m-%d`, or the unknown date for blank/invalid input
pub fn parse_release_date(value: Option<&str>) -> NaiveDate {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok())
        .unwrap_or_else(unknown_release_date)
}

/// Integer id from a string or number; blank → 0
pub fn coerce_id(entity: &str, field: &str, value: &Scalar) -> ImportResult<i64> {
    match value {
        Scalar::Integer(n) => Ok(*n),
        Scalar::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(*f as i64),
        Scalar::Float(f) => Err(ImportError::mapping(entity, format!("{} is not an integer: {}", field, f))),
        Scalar::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(0);
            }
            text.parse::<i64>().map_err(|_| {
                ImportError::mapping(entity, format!("{} is not numeric: {:?}", field, text))
            })
        }
    }
}

/// Trimmed, blank-free, de-duplicated names (first occurrence wins)
fn type_names(values: Option<&[String]>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .unwrap_or_default()
        .iter()
        .filter_map(|v| non_blank(Some(v)))
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

fn scalar_text(value: Option<&Scalar>) -> Option<String> {
    value.and_then(|v| non_blank(Some(&v.to_string())))
}

fn trimmed(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn non_blank<S: AsRef<str>>(value: Option<S>) -> Option<String> {
    let value = value?;
    let value = value.as_ref().trim();
    (!value.is_empty()).then(|| value.to_string())
}
