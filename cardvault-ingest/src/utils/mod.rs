//! Utility modules for cardvault-ingest

pub mod db_retry;

pub use db_retry::{retry_on_conflict, retry_on_lock};
