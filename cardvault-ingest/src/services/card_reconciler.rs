//! Card reconciliation
//!
//! **Algorithm:**
//! 1. Card + faces in one transaction: create the card and all faces, or diff
//!    the card scalars and merge faces (exact match, then name-only; orphans
//!    deleted with their children first). Post-check the persisted face count.
//! 2. Per face, type assignments in their own transaction (find-or-create
//!    dictionary rows, then add/remove join rows).
//! 3. Per face, translations in their own transaction.
//!
//! A new face skips every lookup of its children.

use super::face_matcher::match_faces;
use super::reconciler::Reconciler;
use crate::db::{self, FaceRow};
use crate::error::{ImportError, ImportResult};
use crate::models::{Card, Changeset, CharacteristicKind, Face, StatsSnapshot};
use sqlx::SqliteConnection;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// A persisted face and whether this run created it
#[derive(Debug, Clone, Copy)]
struct FaceSlot {
    face_id: i64,
    created: bool,
}

impl Reconciler {
    /// Create or merge one complete card and everything below it
    pub async fn reconcile_card(&self, card: &Card) -> ImportResult<()> {
        let slots = self
            .in_scope("card reconciliation", || self.write_card(card))
            .await?;

        for (face, slot) in card.faces.iter().zip(&slots) {
            self.in_scope("face type assignment", || self.write_face_types(face, *slot))
                .await?;
            self.in_scope("face translations", || self.write_face_translations(face, *slot))
                .await?;
        }

        debug!(
            set_code = %card.set_code,
            number = %card.number,
            faces = slots.len(),
            "Reconciled card"
        );
        Ok(())
    }

    async fn write_card(&self, card: &Card) -> ImportResult<(Vec<FaceSlot>, StatsSnapshot)> {
        let mut delta = StatsSnapshot::default();
        let mut tx = self.pool.begin().await?;

        let (card_id, slots) = match db::find_card_by_key(&mut tx, &card.set_code, &card.number).await? {
            None => {
                let card_id = db::create_card(&mut tx, card).await?;
                let mut slots = Vec::with_capacity(card.faces.len());
                for (position, face) in card.faces.iter().enumerate() {
                    let face_id = db::create_face(&mut tx, card_id, position as i64, face).await?;
                    slots.push(FaceSlot {
                        face_id,
                        created: true,
                    });
                }
                delta.cards_created += 1;
                delta.faces_created += slots.len();
                debug!(set_code = %card.set_code, number = %card.number, card_id, "Created card");
                (card_id, slots)
            }
            Some(row) => {
                let mut changes = Changeset::new();
                changes
                    .compare("name", &row.name, &card.name)
                    .compare("rarity", &row.rarity, &card.rarity)
                    .compare("border", &row.border, &card.border)
                    .compare("layout", &row.layout, &card.layout);

                if changes.has_changes() {
                    db::update_card(&mut tx, row.id, card).await?;
                    delta.cards_updated += 1;
                    debug!(
                        set_code = %card.set_code,
                        number = %card.number,
                        changes = %changes,
                        "Updated card"
                    );
                }

                let slots = merge_faces(&mut tx, row.id, card, &mut delta).await?;
                (row.id, slots)
            }
        };

        let persisted = db::find_faces_of_card(&mut tx, card_id).await?.len();
        if persisted != card.faces.len() {
            return Err(ImportError::Consistency(format!(
                "card {}#{} has {} persisted faces, expected {}",
                card.set_code,
                card.number,
                persisted,
                card.faces.len()
            )));
        }

        tx.commit().await?;
        Ok((slots, delta))
    }

    async fn write_face_types(&self, face: &Face, slot: FaceSlot) -> ImportResult<((), StatsSnapshot)> {
        let mut delta = StatsSnapshot::default();
        let mut tx = self.pool.begin().await?;

        for kind in CharacteristicKind::ALL {
            let incoming = face.types(kind);

            let missing: Vec<&String> = if slot.created {
                incoming.iter().collect()
            } else {
                let assigned = db::find_assigned_types(&mut tx, kind, slot.face_id).await?;
                let wanted: HashSet<&str> = incoming.iter().map(String::as_str).collect();
                let present: HashSet<&str> = assigned.iter().map(|t| t.name.as_str()).collect();

                let stale: Vec<i64> = assigned
                    .iter()
                    .filter(|t| !wanted.contains(t.name.as_str()))
                    .map(|t| t.type_id)
                    .collect();
                if !stale.is_empty() {
                    let removed = db::unassign_types_from_face(&mut tx, kind, slot.face_id, &stale).await?;
                    delta.types_unassigned += removed as usize;
                    debug!(face = %face.name, kind = %kind, removed, "Unassigned types");
                }

                incoming
                    .iter()
                    .filter(|name| !present.contains(name.as_str()))
                    .collect()
            };

            for name in missing {
                let (type_id, _) =
                    db::find_or_create_characteristic_type(&mut tx, kind, name).await?;
                if db::assign_type_to_face(&mut tx, kind, slot.face_id, type_id).await? {
                    delta.types_assigned += 1;
                }
            }
        }

        tx.commit().await?;
        Ok(((), delta))
    }

    async fn write_face_translations(
        &self,
        face: &Face,
        slot: FaceSlot,
    ) -> ImportResult<((), StatsSnapshot)> {
        let mut delta = StatsSnapshot::default();
        let mut tx = self.pool.begin().await?;

        if slot.created {
            for translation in &face.translations {
                db::upsert_face_translation(&mut tx, slot.face_id, translation).await?;
            }
            delta.translations_created += face.translations.len();
        } else {
            let existing = db::find_face_translations(&mut tx, slot.face_id).await?;
            let mut stored: HashMap<&str, _> =
                existing.iter().map(|t| (t.language.as_str(), t)).collect();

            for translation in &face.translations {
                match stored.remove(translation.language.as_str()) {
                    None => {
                        db::upsert_face_translation(&mut tx, slot.face_id, translation).await?;
                        delta.translations_created += 1;
                    }
                    Some(row) => {
                        let mut changes = Changeset::new();
                        changes
                            .compare("name", &row.name, &translation.name)
                            .compare("text", &row.text, &translation.text)
                            .compare("flavor_text", &row.flavor_text, &translation.flavor_text)
                            .compare("type_line", &row.type_line, &translation.type_line)
                            .compare("multiverse_id", &row.multiverse_id, &translation.multiverse_id);

                        if changes.has_changes() {
                            db::upsert_face_translation(&mut tx, slot.face_id, translation).await?;
                            delta.translations_updated += 1;
                            debug!(
                                face = %face.name,
                                language = %translation.language,
                                changes = %changes,
                                "Updated face translation"
                            );
                        }
                    }
                }
            }

            for row in stored.into_values() {
                db::delete_face_translation(&mut tx, row.id).await?;
                delta.translations_deleted += 1;
                debug!(face = %face.name, language = %row.language, "Deleted face translation");
            }
        }

        tx.commit().await?;
        Ok(((), delta))
    }
}

/// Merge incoming faces into a persisted card; returns one slot per incoming face
async fn merge_faces(
    conn: &mut SqliteConnection,
    card_id: i64,
    card: &Card,
    delta: &mut StatsSnapshot,
) -> ImportResult<Vec<FaceSlot>> {
    let existing = db::find_faces_of_card(conn, card_id).await?;
    let matches = match_faces(&existing, &card.faces);

    for &orphan in &matches.orphaned {
        let row = &existing[orphan];
        db::delete_face(conn, row.id).await?;
        delta.faces_deleted += 1;
        debug!(
            set_code = %card.set_code,
            number = %card.number,
            face = %row.name,
            "Deleted face"
        );
    }

    let mut slots = Vec::with_capacity(card.faces.len());
    for (position, (face, matched)) in card.faces.iter().zip(&matches.incoming).enumerate() {
        let position = position as i64;

        let slot = match matched {
            Some(index) => {
                let row = &existing[*index];
                let changes = face_changes(row, position, face);
                if changes.has_changes() {
                    db::update_face(conn, row.id, position, face).await?;
                    delta.faces_updated += 1;
                    debug!(
                        set_code = %card.set_code,
                        number = %card.number,
                        face = %face.name,
                        changes = %changes,
                        "Updated face"
                    );
                }
                FaceSlot {
                    face_id: row.id,
                    created: false,
                }
            }
            None => {
                let face_id = db::create_face(conn, card_id, position, face).await?;
                delta.faces_created += 1;
                debug!(
                    set_code = %card.set_code,
                    number = %card.number,
                    face = %face.name,
                    "Created face"
                );
                FaceSlot {
                    face_id,
                    created: true,
                }
            }
        };
        slots.push(slot);
    }

    Ok(slots)
}

fn face_changes(row: &FaceRow, position: i64, face: &Face) -> Changeset {
    let mut changes = Changeset::new();
    changes
        .compare("position", &row.position, &position)
        .compare("name", &row.name, &face.name)
        .compare("text", &row.text, &face.text)
        .compare("flavor_text", &row.flavor_text, &face.flavor_text)
        .compare("type_line", &row.type_line, &face.type_line)
        .compare("multiverse_id", &row.multiverse_id, &face.multiverse_id)
        .compare("artist", &row.artist, &face.artist)
        .compare("converted_mana_cost", &row.converted_mana_cost, &face.converted_mana_cost)
        .compare("colors", &row.colors, &face.colors)
        .compare("hand_modifier", &row.hand_modifier, &face.hand_modifier)
        .compare("life_modifier", &row.life_modifier, &face.life_modifier)
        .compare("loyalty", &row.loyalty, &face.loyalty)
        .compare("mana_cost", &row.mana_cost, &face.mana_cost)
        .compare("power", &row.power, &face.power)
        .compare("toughness", &row.toughness, &face.toughness);
    changes
}
