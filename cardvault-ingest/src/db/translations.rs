//! Set and face translation database operations
//!
//! Translations are keyed within their parent by internal language code;
//! upserts rely on the (parent, language) unique constraint.

use crate::error::ImportResult;
use crate::models::{FaceTranslation, SetTranslation};
use sqlx::{Row, SqliteConnection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetTranslationRow {
    pub id: i64,
    pub language: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceTranslationRow {
    pub id: i64,
    pub language: String,
    pub name: String,
    pub text: String,
    pub flavor_text: String,
    pub type_line: String,
    pub multiverse_id: i64,
}

pub async fn find_set_translations(
    conn: &mut SqliteConnection,
    set_id: i64,
) -> ImportResult<Vec<SetTranslationRow>> {
    let rows = sqlx::query("SELECT id, language, name FROM set_translations WHERE set_id = ? ORDER BY id")
        .bind(set_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(rows
        .iter()
        .map(|row| SetTranslationRow {
            id: row.get("id"),
            language: row.get("language"),
            name: row.get("name"),
        })
        .collect())
}

pub async fn upsert_set_translation(
    conn: &mut SqliteConnection,
    set_id: i64,
    translation: &SetTranslation,
) -> ImportResult<()> {
    sqlx::query(
        r#"
        INSERT INTO set_translations (set_id, language, name)
        VALUES (?, ?, ?)
        ON CONFLICT(set_id, language) DO UPDATE SET
            name = excluded.name
        "#,
    )
    .bind(set_id)
    .bind(&translation.language)
    .bind(&translation.name)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn delete_set_translation(conn: &mut SqliteConnection, id: i64) -> ImportResult<()> {
    sqlx::query("DELETE FROM set_translations WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

pub async fn find_face_translations(
    conn: &mut SqliteConnection,
    face_id: i64,
) -> ImportResult<Vec<FaceTranslationRow>> {
    let rows = sqlx::query(
        r#"
        SELECT id, language, name, text, flavor_text, type_line, multiverse_id
        FROM face_translations
        WHERE face_id = ?
        ORDER BY id
        "#,
    )
    .bind(face_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .iter()
        .map(|row| FaceTranslationRow {
            id: row.get("id"),
            language: row.get("language"),
            name: row.get("name"),
            text: row.get("text"),
            flavor_text: row.get("flavor_text"),
            type_line: row.get("type_line"),
            multiverse_id: row.get("multiverse_id"),
        })
        .collect())
}

pub async fn upsert_face_translation(
    conn: &mut SqliteConnection,
    face_id: i64,
    translation: &FaceTranslation,
) -> ImportResult<()> {
    sqlx::query(
        r#"
        INSERT INTO face_translations (face_id, language, name, text, flavor_text, type_line, multiverse_id)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(face_id, language) DO UPDATE SET
            name = excluded.name,
            text = excluded.text,
            flavor_text = excluded.flavor_text,
            type_line = excluded.type_line,
            multiverse_id = excluded.multiverse_id
        "#,
    )
    .bind(face_id)
    .bind(&translation.language)
    .bind(&translation.name)
    .bind(&translation.text)
    .bind(&translation.flavor_text)
    .bind(&translation.type_line)
    .bind(translation.multiverse_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn delete_face_translation(conn: &mut SqliteConnection, id: i64) -> ImportResult<()> {
    sqlx::query("DELETE FROM face_translations WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
