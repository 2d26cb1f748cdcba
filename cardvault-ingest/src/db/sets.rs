//! Set and block database operations

use crate::error::ImportResult;
use crate::models::CardSet;
use chrono::NaiveDate;
use sqlx::{Row, SqliteConnection};

/// Persisted set, with its block name resolved
#[derive(Debug, Clone, PartialEq)]
pub struct SetRow {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub set_type: String,
    pub total_set_size: i64,
    pub release_date: NaiveDate,
    pub block_id: Option<i64>,
    pub block: Option<String>,
}

/// Load set by code
pub async fn find_set_by_code(conn: &mut SqliteConnection, code: &str) -> ImportResult<Option<SetRow>> {
    let row = sqlx::query(
        r#"
        SELECT s.id, s.code, s.name, s.set_type, s.total_set_size, s.release_date,
               s.block_id, b.name AS block_name
        FROM card_sets s
        LEFT JOIN card_blocks b ON b.id = s.block_id
        WHERE s.code = ?
        "#,
    )
    .bind(code)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(|row| SetRow {
        id: row.get("id"),
        code: row.get("code"),
        name: row.get("name"),
        set_type: row.get("set_type"),
        total_set_size: row.get("total_set_size"),
        release_date: row.get("release_date"),
        block_id: row.get("block_id"),
        block: row.get("block_name"),
    }))
}

/// Insert a set row (translations are written separately)
pub async fn create_set(
    conn: &mut SqliteConnection,
    set: &CardSet,
    block_id: Option<i64>,
) -> ImportResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO card_sets (
            code, name, set_type, total_set_size, release_date, block_id,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(&set.code)
    .bind(&set.name)
    .bind(&set.set_type)
    .bind(set.total_set_size)
    .bind(set.release_date)
    .bind(block_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Overwrite the scalar columns of an existing set
pub async fn update_set(
    conn: &mut SqliteConnection,
    id: i64,
    set: &CardSet,
    block_id: Option<i64>,
) -> ImportResult<()> {
    sqlx::query(
        r#"
        UPDATE card_sets
        SET name = ?, set_type = ?, total_set_size = ?, release_date = ?, block_id = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&set.name)
    .bind(&set.set_type)
    .bind(set.total_set_size)
    .bind(set.release_date)
    .bind(block_id)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn find_block_by_name(conn: &mut SqliteConnection, name: &str) -> ImportResult<Option<i64>> {
    let id = sqlx::query_scalar("SELECT id FROM card_blocks WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(id)
}

/// Insert a block; a concurrent duplicate surfaces as a transient conflict
pub async fn create_block(conn: &mut SqliteConnection, name: &str) -> ImportResult<i64> {
    let result = sqlx::query("INSERT INTO card_blocks (name) VALUES (?)")
        .bind(name)
        .execute(&mut *conn)
        .await?;

    Ok(result.last_insert_rowid())
}

pub async fn count_sets(conn: &mut SqliteConnection) -> ImportResult<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM card_sets")
        .fetch_one(&mut *conn)
        .await?;

    Ok(count)
}
