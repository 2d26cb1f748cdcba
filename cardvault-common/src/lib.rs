//! # Cardvault Common Library
//!
//! Shared code for the cardvault crates including:
//! - Error type shared by all crates
//! - Configuration loading and root folder resolution
//! - SQLite bootstrap and catalog schema

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
