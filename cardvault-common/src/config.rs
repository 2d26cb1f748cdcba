//! Configuration loading and root folder resolution
//!
//! Two sources feed the runtime configuration:
//! 1. **TOML bootstrap file**: root folder, database path, logging, import tuning
//! 2. **Command-line / environment**: overrides applied by the binary
//!
//! A missing or unreadable TOML file is never fatal; compiled defaults are used
//! and a warning is logged.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "CARDVAULT_ROOT_FOLDER";

/// Database file name created inside the root folder
pub const DEFAULT_DATABASE_FILE: &str = "cardvault.db";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Root folder holding the database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Explicit database path; defaults to `<root_folder>/cardvault.db`
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Import tuning
    #[serde(default)]
    pub import: ImportSettings,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Import tuning parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImportSettings {
    /// Maximum number of card reconciliation tasks running at once
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of the parser → coordinator record channel
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Fixed delay before the single retry of a duplicate-key conflict
    #[serde(default = "default_conflict_retry_delay_ms")]
    pub conflict_retry_delay_ms: u64,

    /// Upper bound for retrying "database is locked" errors
    #[serde(default = "default_max_lock_wait_ms")]
    pub max_lock_wait_ms: u64,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            channel_capacity: default_channel_capacity(),
            conflict_retry_delay_ms: default_conflict_retry_delay_ms(),
            max_lock_wait_ms: default_max_lock_wait_ms(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_workers() -> usize {
    4
}

fn default_channel_capacity() -> usize {
    64
}

fn default_conflict_retry_delay_ms() -> u64 {
    50
}

fn default_max_lock_wait_ms() -> u64 {
    5000
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse TOML {} failed: {}", path.display(), e)))
    }

    /// Load the config file, falling back to defaults when it is missing or invalid
    ///
    /// An explicit path takes precedence over the platform config locations.
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Ok(path) => path,
                Err(e) => {
                    info!("No config file found ({}), using compiled defaults", e);
                    return Self::default();
                }
            },
        };

        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Could not load {}: {}. Using compiled defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Database path: explicit setting or `<root_folder>/cardvault.db`
    pub fn database_path(&self, root_folder: &Path) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| root_folder.join(DEFAULT_DATABASE_FILE))
    }
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Get default configuration file path for the platform
fn default_config_path() -> Result<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("cardvault").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Ok(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/cardvault/config.toml");
        if system_config.exists() {
            return Ok(system_config);
        }
    }

    Err(Error::Config("No config file found".to_string()))
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("cardvault"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/cardvault"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("cardvault"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/cardvault"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("cardvault"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\cardvault"))
    } else {
        PathBuf::from("./cardvault_data")
    }
}
