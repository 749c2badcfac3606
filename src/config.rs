use anyhow::{Result, anyhow};
use std::path::{Path, PathBuf};

use crate::logging::LogConfig;

/// Directory under the home directory that holds everything below.
pub const DATA_DIR_NAME: &str = ".keepvault";
pub const DATABASE_FILE: &str = "vault.kdbx";
pub const LOG_FILE: &str = "keepvault.log";
pub const HISTORY_FILE: &str = "history";
/// Shell history lines kept between sessions.
pub const DEFAULT_HISTORY_SIZE: usize = 1000;

/// Where keepvault keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub log_path: PathBuf,
    pub history_path: PathBuf,
    pub history_size: usize,
}

impl AppConfig {
    /// Defaults rooted at `~/.keepvault`.
    pub fn load() -> Result<Self> {
        let home =
            dirs_next::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
        Ok(Self::in_dir(home.join(DATA_DIR_NAME)))
    }

    /// Defaults rooted at `data_dir`; used by tests and `load`.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        Self {
            database_path: data_dir.join(DATABASE_FILE),
            log_path: data_dir.join(LOG_FILE),
            history_path: data_dir.join(HISTORY_FILE),
            history_size: DEFAULT_HISTORY_SIZE,
            data_dir,
        }
    }

    /// Points at a database outside the data directory.
    pub fn with_database(mut self, path: impl AsRef<Path>) -> Self {
        self.database_path = path.as_ref().to_path_buf();
        self
    }

    /// Creates the data directory if it is missing.
    pub fn ensure_data_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    /// Logging settings pointing at this configuration's log file.
    pub fn log_config(&self) -> LogConfig {
        LogConfig::new(&self.log_path)
    }
}
