//! Card face database operations

use crate::error::ImportResult;
use crate::models::{CharacteristicKind, Face};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

/// Persisted face scalars
#[derive(Debug, Clone, PartialEq)]
pub struct FaceRow {
    pub id: i64,
    pub card_id: i64,
    pub position: i64,
    pub name: String,
    pub text: String,
    pub flavor_text: String,
    pub type_line: String,
    pub multiverse_id: i64,
    pub artist: String,
    pub converted_mana_cost: f64,
    pub colors: Vec<String>,
    pub hand_modifier: Option<String>,
    pub life_modifier: Option<String>,
    pub loyalty: Option<String>,
    pub mana_cost: Option<String>,
    pub power: Option<String>,
    pub toughness: Option<String>,
}

impl FaceRow {
    fn from_row(row: &SqliteRow) -> Self {
        let colors: Option<String> = row.get("colors");
        Self {
            id: row.get("id"),
            card_id: row.get("card_id"),
            position: row.get("position"),
            name: row.get("name"),
            text: row.get("text"),
            flavor_text: row.get("flavor_text"),
            type_line: row.get("type_line"),
            multiverse_id: row.get("multiverse_id"),
            artist: row.get("artist"),
            converted_mana_cost: row.get("converted_mana_cost"),
            colors: split_colors(colors.as_deref()),
            hand_modifier: row.get("hand_modifier"),
            life_modifier: row.get("life_modifier"),
            loyalty: row.get("loyalty"),
            mana_cost: row.get("mana_cost"),
            power: row.get("power"),
            toughness: row.get("toughness"),
        }
    }
}

/// Colors are stored comma-joined; no colors is NULL
fn join_colors(colors: &[String]) -> Option<String> {
    (!colors.is_empty()).then(|| colors.join(","))
}

fn split_colors(colors: Option<&str>) -> Vec<String> {
    colors
        .unwrap_or_default()
        .split(',')
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Faces of a card ordered by position
pub async fn find_faces_of_card(conn: &mut SqliteConnection, card_id: i64) -> ImportResult<Vec<FaceRow>> {
    let rows = sqlx::query(
        r#"
        SELECT id, card_id, position, name, text, flavor_text, type_line, multiverse_id,
               artist, converted_mana_cost, colors, hand_modifier, life_modifier, loyalty,
               mana_cost, power, toughness
        FROM card_faces
        WHERE card_id = ?
        ORDER BY position, id
        "#,
    )
    .bind(card_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.iter().map(FaceRow::from_row).collect())
}

/// Insert a face (type assignments and translations are written separately)
pub async fn create_face(
    conn: &mut SqliteConnection,
    card_id: i64,
    position: i64,
    face: &Face,
) -> ImportResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO card_faces (
            card_id, position, name, text, flavor_text, type_line, multiverse_id, artist,
            converted_mana_cost, colors, hand_modifier, life_modifier, loyalty, mana_cost,
            power, toughness
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(card_id)
    .bind(position)
    .bind(&face.name)
    .bind(&face.text)
    .bind(&face.flavor_text)
    .bind(&face.type_line)
    .bind(face.multiverse_id)
    .bind(&face.artist)
    .bind(face.converted_mana_cost)
    .bind(join_colors(&face.colors))
    .bind(&face.hand_modifier)
    .bind(&face.life_modifier)
    .bind(&face.loyalty)
    .bind(&face.mana_cost)
    .bind(&face.power)
    .bind(&face.toughness)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn update_face(
    conn: &mut SqliteConnection,
    id: i64,
    position: i64,
    face: &Face,
) -> ImportResult<()> {
    sqlx::query(
        r#"
        UPDATE card_faces
        SET position = ?, name = ?, text = ?, flavor_text = ?, type_line = ?,
            multiverse_id = ?, artist = ?, converted_mana_cost = ?, colors = ?,
            hand_modifier = ?, life_modifier = ?, loyalty = ?, mana_cost = ?,
            power = ?, toughness = ?
        WHERE id = ?
        "#,
    )
    .bind(position)
    .bind(&face.name)
    .bind(&face.text)
    .bind(&face.flavor_text)
    .bind(&face.type_line)
    .bind(face.multiverse_id)
    .bind(&face.artist)
    .bind(face.converted_mana_cost)
    .bind(join_colors(&face.colors))
    .bind(&face.hand_modifier)
    .bind(&face.life_modifier)
    .bind(&face.loyalty)
    .bind(&face.mana_cost)
    .bind(&face.power)
    .bind(&face.toughness)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Delete a face, its translations and type assignments first
pub async fn delete_face(conn: &mut SqliteConnection, id: i64) -> ImportResult<()> {
    sqlx::query("DELETE FROM face_translations WHERE face_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    for kind in CharacteristicKind::ALL {
        let sql = format!("DELETE FROM {} WHERE face_id = ?", kind.assignment_table());
        sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
    }

    sqlx::query("DELETE FROM card_faces WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colors_storage_format() {
        assert_eq!(join_colors(&[]), None);
        assert_eq!(
            join_colors(&["W".to_string(), "U".to_string()]).as_deref(),
            Some("W,U")
        );
        assert_eq!(split_colors(None), Vec::<String>::new());
        assert_eq!(split_colors(Some("W,U")), vec!["W", "U"]);
    }
}
