//! Errors raised while bootstrapping a cardvault process

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Config and database bootstrap failures
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML file missing or unparseable
    #[error("Configuration error: {0}")]
    Config(String),
}
