//! Card database operations

use crate::error::ImportResult;
use crate::models::Card;
use sqlx::{Row, SqliteConnection};

/// Persisted card scalars (faces are loaded separately)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRow {
    pub id: i64,
    pub set_code: String,
    pub number: String,
    pub name: String,
    pub rarity: String,
    pub border: String,
    pub layout: String,
}

/// Load card by its natural key
pub async fn find_card_by_key(
    conn: &mut SqliteConnection,
    set_code: &str,
    number: &str,
) -> ImportResult<Option<CardRow>> {
    let row = sqlx::query(
        r#"
        SELECT id, set_code, number, name, rarity, border, layout
        FROM cards
        WHERE set_code = ? AND number = ?
        "#,
    )
    .bind(set_code)
    .bind(number)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(|row| CardRow {
        id: row.get("id"),
        set_code: row.get("set_code"),
        number: row.get("number"),
        name: row.get("name"),
        rarity: row.get("rarity"),
        border: row.get("border"),
        layout: row.get("layout"),
    }))
}

pub async fn create_card(conn: &mut SqliteConnection, card: &Card) -> ImportResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO cards (set_code, number, name, rarity, border, layout, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(&card.set_code)
    .bind(&card.number)
    .bind(&card.name)
    .bind(&card.rarity)
    .bind(&card.border)
    .bind(&card.layout)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Overwrite the non-key scalars of an existing card
pub async fn update_card(conn: &mut SqliteConnection, id: i64, card: &Card) -> ImportResult<()> {
    sqlx::query(
        r#"
        UPDATE cards
        SET name = ?, rarity = ?, border = ?, layout = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&card.name)
    .bind(&card.rarity)
    .bind(&card.border)
    .bind(&card.layout)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn count_cards(conn: &mut SqliteConnection) -> ImportResult<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM cards")
        .fetch_one(&mut *conn)
        .await?;

    Ok(count)
}
