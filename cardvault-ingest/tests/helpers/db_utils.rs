//! Database Test Utilities
//!
//! Temporary catalog databases and helpers for inspecting persisted state

use anyhow::Result;
use cardvault_common::config::ImportSettings;
use cardvault_ingest::{ImportCoordinator, ImportReport, ImportResult};
use sqlx::SqlitePool;
use std::io::Cursor;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Create temporary test database with the catalog schema applied
///
/// Returns (TempDir, SqlitePool) - TempDir must be kept alive for duration of test
pub async fn create_test_db() -> Result<(TempDir, SqlitePool)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test_cardvault.db");

    let pool = cardvault_common::db::init_database(&db_path).await?;

    Ok((temp_dir, pool))
}

/// Import settings with a short conflict delay
pub fn test_settings() -> ImportSettings {
    ImportSettings {
        workers: 4,
        channel_capacity: 8,
        conflict_retry_delay_ms: 10,
        max_lock_wait_ms: 10_000,
    }
}

/// Run one import of an in-memory document
pub async fn import_document(pool: &SqlitePool, document: Vec<u8>) -> ImportResult<ImportReport> {
    ImportCoordinator::new(pool.clone(), test_settings())
        .run(Cursor::new(document), CancellationToken::new())
        .await
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Render all persisted catalog state by natural keys (no row ids, no timestamps)
///
/// Dictionary tables are excluded: their rows are never deleted, so only the
/// assignments are comparable across databases.
pub async fn catalog_snapshot(pool: &SqlitePool) -> Vec<String> {
    let queries = [
        r#"SELECT 'set|' || s.code || '|' || s.name || '|' || s.set_type || '|' || s.total_set_size
                  || '|' || s.release_date || '|' || COALESCE(b.name, '-')
           FROM card_sets s LEFT JOIN card_blocks b ON b.id = s.block_id"#,
        r#"SELECT 'set_tr|' || s.code || '|' || t.language || '|' || t.name
           FROM set_translations t JOIN card_sets s ON s.id = t.set_id"#,
        r#"SELECT 'card|' || set_code || '|' || number || '|' || name || '|' || rarity || '|'
                  || border || '|' || layout
           FROM cards"#,
        r#"SELECT 'face|' || c.set_code || '|' || c.number || '|' || f.position || '|' || f.name
                  || '|' || f.text || '|' || f.flavor_text || '|' || f.type_line || '|'
                  || f.multiverse_id || '|' || f.artist || '|' || f.converted_mana_cost || '|'
                  || COALESCE(f.colors, '-') || '|' || COALESCE(f.loyalty, '-') || '|'
                  || COALESCE(f.power, '-') || '|' || COALESCE(f.toughness, '-')
           FROM card_faces f JOIN cards c ON c.id = f.card_id"#,
        r#"SELECT 'face_tr|' || c.set_code || '|' || c.number || '|' || f.name || '|' || t.language
                  || '|' || t.name || '|' || t.text || '|' || t.multiverse_id
           FROM face_translations t
           JOIN card_faces f ON f.id = t.face_id
           JOIN cards c ON c.id = f.card_id"#,
        r#"SELECT 'card_type|' || c.set_code || '|' || c.number || '|' || f.name || '|' || d.name
           FROM face_card_types a
           JOIN card_types d ON d.id = a.type_id
           JOIN card_faces f ON f.id = a.face_id
           JOIN cards c ON c.id = f.card_id"#,
        r#"SELECT 'super_type|' || c.set_code || '|' || c.number || '|' || f.name || '|' || d.name
           FROM face_super_types a
           JOIN super_types d ON d.id = a.type_id
           JOIN card_faces f ON f.id = a.face_id
           JOIN cards c ON c.id = f.card_id"#,
        r#"SELECT 'sub_type|' || c.set_code || '|' || c.number || '|' || f.name || '|' || d.name
           FROM face_sub_types a
           JOIN sub_types d ON d.id = a.type_id
           JOIN card_faces f ON f.id = a.face_id
           JOIN cards c ON c.id = f.card_id"#,
    ];

    let mut lines = Vec::new();
    for query in queries {
        let rows: Vec<String> = sqlx::query_scalar(query).fetch_all(pool).await.unwrap();
        lines.extend(rows);
    }
    lines.sort();
    lines
}
