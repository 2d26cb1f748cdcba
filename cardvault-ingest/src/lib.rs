//! cardvault-ingest library interface
//!
//! Catalog synchronization engine:
//! byte stream → [`parser`] → [`mapper`] → [`collator`] (multi-face cards only)
//! → [`services`] (reconciliation against [`db`]), driven by
//! [`ImportCoordinator`].

pub mod collator;
pub mod db;
pub mod error;
pub mod mapper;
pub mod models;
pub mod parser;
pub mod services;
pub mod utils;

pub use crate::error::{ImportError, ImportResult};
pub use crate::models::{ImportReport, StatsSnapshot};
pub use crate::services::{ImportCoordinator, Reconciler};
