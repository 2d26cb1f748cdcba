//! Data models for cardvault-ingest
//!
//! - Catalog domain entities produced by the mapper
//! - Changesets computed by the reconciliation engine
//! - Import session state machine and final report

pub mod catalog;
pub mod changeset;
pub mod import_report;
pub mod import_session;

pub use catalog::{
    Card, CardKey, CardSet, CharacteristicKind, Face, FaceTranslation, SetTranslation,
};
pub use changeset::{Changeset, FieldChange};
pub use import_report::{ImportReport, ImportStats, StatsSnapshot};
pub use import_session::{ImportSession, ImportState};
