//! Store configuration loaded from environment variables.
//!
//! All settings have defaults so the store opens with zero configuration.

use std::path::PathBuf;
use std::time::Duration;

use agora_shared::constants::APP_NAME;
use directories::ProjectDirs;

use crate::error::{Result, StoreError};

/// Default time a writer waits for another handle's write lock.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Database file. `None` means the platform data directory:
    /// - Linux:   `~/.local/share/agora/agora.db`
    /// - macOS:   `~/Library/Application Support/org.agora.agora/agora.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\agora\agora\data\agora.db`
    ///
    /// Env: `AGORA_DB_PATH`
    pub db_path: Option<PathBuf>,

    /// How long a write transaction waits for a competing writer.
    /// Env: `AGORA_BUSY_TIMEOUT_MS`
    /// Default: 5000
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("AGORA_DB_PATH") {
            if !path.is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        if let Some(val) = lookup("AGORA_BUSY_TIMEOUT_MS") {
            match val.parse::<u64>() {
                Ok(ms) => config.busy_timeout = Duration::from_millis(ms),
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid AGORA_BUSY_TIMEOUT_MS, using default");
                }
            }
        }

        config
    }

    /// Resolve the database file, creating the platform data directory when
    /// no explicit path is configured.
    pub fn resolve_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        let project_dirs = ProjectDirs::from("org", APP_NAME, APP_NAME).ok_or(StoreError::NoDataDir)?;
        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;
        Ok(data_dir.join(format!("{APP_NAME}.db")))
    }
}
