//! Import report and mutation statistics

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Final result of a successful import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Persisted cards after the import
    pub card_count: i64,
    /// Persisted sets after the import
    pub set_count: i64,
    /// Mutations applied during this run
    pub stats: StatsSnapshot,
}

/// Mutation counters shared by all reconciliation tasks
#[derive(Debug, Default)]
pub struct ImportStats {
    pub sets_created: AtomicUsize,
    pub sets_updated: AtomicUsize,
    pub blocks_created: AtomicUsize,
    pub cards_created: AtomicUsize,
    pub cards_updated: AtomicUsize,
    pub faces_created: AtomicUsize,
    pub faces_updated: AtomicUsize,
    pub faces_deleted: AtomicUsize,
    pub translations_created: AtomicUsize,
    pub translations_updated: AtomicUsize,
    pub translations_deleted: AtomicUsize,
    pub types_assigned: AtomicUsize,
    pub types_unassigned: AtomicUsize,
}

impl ImportStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter by `n`
    pub fn add(counter: &AtomicUsize, n: usize) {
        if n > 0 {
            counter.fetch_add(n, Ordering::Relaxed);
        }
    }

    /// Fold the counts of one committed transaction into the totals
    pub fn record(&self, delta: &StatsSnapshot) {
        Self::add(&self.sets_created, delta.sets_created);
        Self::add(&self.sets_updated, delta.sets_updated);
        Self::add(&self.blocks_created, delta.blocks_created);
        Self::add(&self.cards_created, delta.cards_created);
        Self::add(&self.cards_updated, delta.cards_updated);
        Self::add(&self.faces_created, delta.faces_created);
        Self::add(&self.faces_updated, delta.faces_updated);
        Self::add(&self.faces_deleted, delta.faces_deleted);
        Self::add(&self.translations_created, delta.translations_created);
        Self::add(&self.translations_updated, delta.translations_updated);
        Self::add(&self.translations_deleted, delta.translations_deleted);
        Self::add(&self.types_assigned, delta.types_assigned);
        Self::add(&self.types_unassigned, delta.types_unassigned);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let load = |c: &AtomicUsize| c.load(Ordering::Relaxed);
        StatsSnapshot {
            sets_created: load(&self.sets_created),
            sets_updated: load(&self.sets_updated),
            blocks_created: load(&self.blocks_created),
            cards_created: load(&self.cards_created),
            cards_updated: load(&self.cards_updated),
            faces_created: load(&self.faces_created),
            faces_updated: load(&self.faces_updated),
            faces_deleted: load(&self.faces_deleted),
            translations_created: load(&self.translations_created),
            translations_updated: load(&self.translations_updated),
            translations_deleted: load(&self.translations_deleted),
            types_assigned: load(&self.types_assigned),
            types_unassigned: load(&self.types_unassigned),
        }
    }
}

/// Point-in-time copy of [`ImportStats`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub sets_created: usize,
    pub sets_updated: usize,
    pub blocks_created: usize,
    pub cards_created: usize,
    pub cards_updated: usize,
    pub faces_created: usize,
    pub faces_updated: usize,
    pub faces_deleted: usize,
    pub translations_created: usize,
    pub translations_updated: usize,
    pub translations_deleted: usize,
    pub types_assigned: usize,
    pub types_unassigned: usize,
}

impl StatsSnapshot {
    /// Total number of rows written (created, updated or deleted)
    pub fn total_mutations(&self) -> usize {
        self.sets_created
            + self.sets_updated
            + self.blocks_created
            + self.cards_created
            + self.cards_updated
            + self.faces_created
            + self.faces_updated
            + self.faces_deleted
            + self.translations_created
            + self.translations_updated
            + self.translations_deleted
            + self.types_assigned
            + self.types_unassigned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_serializes_camel_case() {
        let report = ImportReport {
            card_count: 1,
            set_count: 1,
            stats: StatsSnapshot::default(),
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["cardCount"], 1);
        assert_eq!(json["setCount"], 1);
        assert_eq!(json["stats"]["facesCreated"], 0);
    }

    #[test]
    fn test_snapshot_totals() {
        let stats = ImportStats::new();
        ImportStats::add(&stats.cards_created, 2);
        ImportStats::add(&stats.faces_created, 3);
        ImportStats::add(&stats.types_assigned, 0);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.cards_created, 2);
        assert_eq!(snapshot.total_mutations(), 5);
    }

    #[test]
    fn test_record_accumulates_deltas() {
        let stats = ImportStats::new();
        let delta = StatsSnapshot {
            faces_deleted: 1,
            translations_updated: 2,
            ..Default::default()
        };

        stats.record(&delta);
        stats.record(&delta);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.faces_deleted, 2);
        assert_eq!(snapshot.translations_updated, 4);
        assert_eq!(snapshot.total_mutations(), 6);
    }
}
