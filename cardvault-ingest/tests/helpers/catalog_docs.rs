//! Catalog Document Builders
//!
//! Small builders for catalog JSON documents used by the import tests

use serde_json::{json, Value};

/// A card record with the required fields filled in
pub fn card(set_code: &str, number: &str, name: &str) -> Value {
    json!({
        "name": name,
        "setCode": set_code,
        "number": number,
        "rarity": "common",
        "borderColor": "white",
        "layout": "normal",
        "type": "Creature — Bear",
        "types": ["Creature"],
        "subtypes": ["Bear"],
        "identifiers": {"multiverseId": "1000"}
    })
}

/// A set object holding `cards`
pub fn set(code: &str, cards: Vec<Value>) -> Value {
    json!({
        "code": code,
        "name": format!("Set {}", code),
        "type": "core",
        "totalSetSize": cards.len(),
        "releaseDate": "2007-07-13",
        "cards": cards
    })
}

/// Wrap sets into a full document: `{"meta": .., "data": {code: set}}`
pub fn document(sets: Vec<(&str, Value)>) -> Vec<u8> {
    let data: serde_json::Map<String, Value> = sets
        .into_iter()
        .map(|(code, set)| (code.to_string(), set))
        .collect();

    serde_json::to_vec(&json!({
        "meta": {"version": "5.2.0", "date": "2024-01-01"},
        "data": data
    }))
    .unwrap()
}
