//! Catalog storage repository
//!
//! Thin functions over `sqlx` + SQLite. Every function takes a
//! `&mut SqliteConnection` so callers decide whether it runs inside a
//! transaction (`&mut *tx`) or on a pooled connection (`&mut *conn`).
//!
//! Schema is created by `cardvault_common::db::init_database`.

pub mod cards;
pub mod faces;
pub mod sets;
pub mod translations;
pub mod types;

pub use cards::{count_cards, create_card, find_card_by_key, update_card, CardRow};
pub use faces::{create_face, delete_face, find_faces_of_card, update_face, FaceRow};
pub use sets::{
    count_sets, create_block, create_set, find_block_by_name, find_set_by_code, update_set, SetRow,
};
pub use translations::{
    delete_face_translation, delete_set_translation, find_face_translations,
    find_set_translations, upsert_face_translation, upsert_set_translation, FaceTranslationRow,
    SetTranslationRow,
};
pub use types::{
    assign_type_to_face, find_assigned_types, find_characteristic_type,
    find_or_create_characteristic_type, unassign_types_from_face, AssignedType,
};
