//! Test Helper Utilities
//!
//! Shared utilities for testing cardvault-ingest

pub mod catalog_docs;
pub mod db_utils;

// Re-export commonly used items
pub use catalog_docs::{card, document, set};
pub use db_utils::{catalog_snapshot, count_rows, create_test_db, import_document, test_settings};
