//! Reconciliation / merge engine
//!
//! Diffs each incoming entity against persisted state and applies only the
//! mutations needed to bring storage in sync.
//!
//! **Atomic scopes:**
//! - set + block reference + set translations: one transaction per set
//! - card + faces: one transaction per card
//! - type assignments of one face, translations of one face: one transaction each
//!
//! Every scope runs inside [`retry_on_lock`] (SQLite writer contention) and
//! [`retry_on_conflict`] (duplicate-key race on a shared dictionary row). A
//! scope is re-run from scratch on retry, so its statistics are only folded
//! into [`ImportStats`] after commit.
//!
//! Card-level reconciliation lives in `card_reconciler`.

use crate::db;
use crate::error::ImportResult;
use crate::models::{CardSet, Changeset, ImportStats, StatsSnapshot};
use crate::utils::{retry_on_conflict, retry_on_lock};
use cardvault_common::config::ImportSettings;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Shared handle used by the coordinator and every card task
#[derive(Clone)]
pub struct Reconciler {
    pub(super) pool: SqlitePool,
    stats: Arc<ImportStats>,
    conflict_retry_delay: Duration,
    max_lock_wait_ms: u64,
}

impl Reconciler {
    pub fn new(pool: SqlitePool, stats: Arc<ImportStats>, settings: &ImportSettings) -> Self {
        Self {
            pool,
            stats,
            conflict_retry_delay: Duration::from_millis(settings.conflict_retry_delay_ms),
            max_lock_wait_ms: settings.max_lock_wait_ms,
        }
    }

    pub fn stats(&self) -> &Arc<ImportStats> {
        &self.stats
    }

    /// Run one atomic scope under both retry policies, then record its counts
    pub(super) async fn in_scope<T, F, Fut>(&self, operation: &str, scope: F) -> ImportResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ImportResult<(T, StatsSnapshot)>>,
    {
        let (value, delta) = retry_on_lock(operation, self.max_lock_wait_ms, || {
            retry_on_conflict(operation, self.conflict_retry_delay, &scope)
        })
        .await?;

        self.stats.record(&delta);
        Ok(value)
    }

    /// Create or update one set with its block reference and translations
    ///
    /// Returns the set's row id.
    pub async fn reconcile_set(&self, set: &CardSet) -> ImportResult<i64> {
        let set_id = self.in_scope("set reconciliation", || self.write_set(set)).await?;

        info!(
            set_code = %set.code,
            name = %set.name,
            translations = set.translations.len(),
            "Reconciled set"
        );
        Ok(set_id)
    }

    async fn write_set(&self, set: &CardSet) -> ImportResult<(i64, StatsSnapshot)> {
        let mut delta = StatsSnapshot::default();
        let mut tx = self.pool.begin().await?;

        let block_id = match set.block.as_deref() {
            Some(name) => Some(find_or_create_block(&mut tx, name, &mut delta).await?),
            None => None,
        };

        let set_id = match db::find_set_by_code(&mut tx, &set.code).await? {
            None => {
                let set_id = db::create_set(&mut tx, set, block_id).await?;
                for translation in &set.translations {
                    db::upsert_set_translation(&mut tx, set_id, translation).await?;
                }
                delta.sets_created += 1;
                delta.translations_created += set.translations.len();
                debug!(set_code = %set.code, set_id, "Created set");
                set_id
            }
            Some(row) => {
                let mut changes = Changeset::new();
                changes
                    .compare("name", &row.name, &set.name)
                    .compare("set_type", &row.set_type, &set.set_type)
                    .compare("total_set_size", &row.total_set_size, &set.total_set_size)
                    .compare("release_date", &row.release_date, &set.release_date)
                    .compare("block", &row.block, &set.block);

                if changes.has_changes() {
                    db::update_set(&mut tx, row.id, set, block_id).await?;
                    delta.sets_updated += 1;
                    debug!(set_code = %set.code, changes = %changes, "Updated set");
                }

                reconcile_set_translations(&mut tx, row.id, set, &mut delta).await?;
                row.id
            }
        };

        tx.commit().await?;
        Ok((set_id, delta))
    }
}

/// Block id for `name`; a concurrent insert surfaces as a transient conflict
async fn find_or_create_block(
    conn: &mut SqliteConnection,
    name: &str,
    delta: &mut StatsSnapshot,
) -> ImportResult<i64> {
    if let Some(id) = db::find_block_by_name(conn, name).await? {
        return Ok(id);
    }

    let id = db::create_block(conn, name).await?;
    delta.blocks_created += 1;
    debug!(block = name, id, "Created block");
    Ok(id)
}

/// Three-way merge of set translations keyed by language
async fn reconcile_set_translations(
    conn: &mut SqliteConnection,
    set_id: i64,
    set: &CardSet,
    delta: &mut StatsSnapshot,
) -> ImportResult<()> {
    let existing = db::find_set_translations(conn, set_id).await?;
    let mut stored: HashMap<&str, _> = existing.iter().map(|t| (t.language.as_str(), t)).collect();

    for translation in &set.translations {
        match stored.remove(translation.language.as_str()) {
            None => {
                db::upsert_set_translation(conn, set_id, translation).await?;
                delta.translations_created += 1;
            }
            Some(row) if row.name != translation.name => {
                db::upsert_set_translation(conn, set_id, translation).await?;
                delta.translations_updated += 1;
                debug!(
                    set_code = %set.code,
                    language = %translation.language,
                    from = %row.name,
                    to = %translation.name,
                    "Updated set translation"
                );
            }
            Some(_) => {}
        }
    }

    for row in stored.into_values() {
        db::delete_set_translation(conn, row.id).await?;
        delta.translations_deleted += 1;
        debug!(set_code = %set.code, language = %row.language, "Deleted set translation");
    }

    Ok(())
}
