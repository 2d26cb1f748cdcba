//! Database initialization
//!
//! Opens (or creates) the catalog database and brings the schema up to date.
//! Every statement is idempotent, so calling [`init_database`] on an existing
//! database is safe.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Current catalog schema version
pub const SCHEMA_VERSION: i64 = 1;

/// Busy timeout applied to every pooled connection
const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Pragmas go through the connect options so every pooled connection gets
    // them, not just the one that happens to run a PRAGMA statement.
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(BUSY_TIMEOUT);

    let pool = SqlitePoolOptions::new()
        .max_connections(20)
        .min_connections(1)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_catalog_schema(&pool).await?;

    Ok(pool)
}

/// Create all catalog tables (idempotent)
pub async fn create_catalog_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;

    // Shared dictionaries
    create_card_blocks_table(pool).await?;
    for table in ["card_types", "super_types", "sub_types"] {
        create_dictionary_table(pool, table).await?;
    }

    // Sets
    create_card_sets_table(pool).await?;
    create_set_translations_table(pool).await?;

    // Cards and faces
    create_cards_table(pool).await?;
    create_card_faces_table(pool).await?;
    create_face_translations_table(pool).await?;

    // Face → dictionary assignments
    for (join_table, dictionary) in [
        ("face_card_types", "card_types"),
        ("face_super_types", "super_types"),
        ("face_sub_types", "sub_types"),
    ] {
        create_assignment_table(pool, join_table, dictionary).await?;
    }

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    info!(version = SCHEMA_VERSION, "Catalog schema ready");
    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_card_blocks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS card_blocks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Dictionary tables share one shape: (id, unique name)
async fn create_dictionary_table(pool: &SqlitePool, table: &str) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        )
        "#
    );
    sqlx::query(&sql).execute(pool).await?;

    Ok(())
}

async fn create_card_sets_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS card_sets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL DEFAULT '',
            set_type TEXT NOT NULL,
            total_set_size INTEGER NOT NULL DEFAULT 0,
            release_date TEXT NOT NULL,
            block_id INTEGER REFERENCES card_blocks(id),
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_set_translations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS set_translations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            set_id INTEGER NOT NULL REFERENCES card_sets(id) ON DELETE CASCADE,
            language TEXT NOT NULL,
            name TEXT NOT NULL,
            UNIQUE (set_id, language)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Cards reference their set by code only: card tasks may commit before the
/// set row of the same import exists.
async fn create_cards_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cards (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            set_code TEXT NOT NULL,
            number TEXT NOT NULL,
            name TEXT NOT NULL,
            rarity TEXT NOT NULL,
            border TEXT NOT NULL,
            layout TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE (set_code, number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_card_faces_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS card_faces (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            card_id INTEGER NOT NULL REFERENCES cards(id) ON DELETE CASCADE,
            position INTEGER NOT NULL,
            name TEXT NOT NULL,
            text TEXT NOT NULL DEFAULT '',
            flavor_text TEXT NOT NULL DEFAULT '',
            type_line TEXT NOT NULL DEFAULT '',
            multiverse_id INTEGER NOT NULL DEFAULT 0,
            artist TEXT NOT NULL DEFAULT '',
            converted_mana_cost REAL NOT NULL DEFAULT 0,
            colors TEXT,
            hand_modifier TEXT,
            life_modifier TEXT,
            loyalty TEXT,
            mana_cost TEXT,
            power TEXT,
            toughness TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_card_faces_card ON card_faces(card_id)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_face_translations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS face_translations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            face_id INTEGER NOT NULL REFERENCES card_faces(id) ON DELETE CASCADE,
            language TEXT NOT NULL,
            name TEXT NOT NULL DEFAULT '',
            text TEXT NOT NULL DEFAULT '',
            flavor_text TEXT NOT NULL DEFAULT '',
            type_line TEXT NOT NULL DEFAULT '',
            multiverse_id INTEGER NOT NULL DEFAULT 0,
            UNIQUE (face_id, language)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_assignment_table(pool: &SqlitePool, join_table: &str, dictionary: &str) -> Result<()> {
    let sql = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {join_table} (
            face_id INTEGER NOT NULL REFERENCES card_faces(id) ON DELETE CASCADE,
            type_id INTEGER NOT NULL REFERENCES {dictionary}(id),
            PRIMARY KEY (face_id, type_id)
        )
        "#
    );
    sqlx::query(&sql).execute(pool).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_database_creates_catalog_tables() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("catalog.db");

        let pool = init_database(&db_path).await.unwrap();
        assert!(db_path.exists());

        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        for expected in [
            "card_blocks",
            "card_faces",
            "card_sets",
            "card_types",
            "cards",
            "face_card_types",
            "face_sub_types",
            "face_super_types",
            "face_translations",
            "schema_version",
            "set_translations",
            "sub_types",
            "super_types",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing table {}", expected);
        }
    }

    #[tokio::test]
    async fn test_init_database_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("catalog.db");

        let pool = init_database(&db_path).await.unwrap();
        sqlx::query("INSERT INTO card_types (name) VALUES ('Creature')")
            .execute(&pool)
            .await
            .unwrap();
        pool.close().await;

        let pool = init_database(&db_path).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM card_types")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);

        let versions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(versions, 1);
    }

    #[tokio::test]
    async fn test_card_key_is_unique() {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("catalog.db")).await.unwrap();

        let insert = "INSERT INTO cards (set_code, number, name, rarity, border, layout) \
                      VALUES ('10E', '1', 'Foo', 'COMMON', 'WHITE', 'NORMAL')";
        sqlx::query(insert).execute(&pool).await.unwrap();
        let duplicate = sqlx::query(insert).execute(&pool).await;

        match duplicate {
            Err(sqlx::Error::Database(e)) => assert!(e.is_unique_violation()),
            other => panic!("expected unique violation, got {:?}", other),
        }
    }
}
