//! Environment configuration and tracing setup.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::Level;

pub const DB_PATH_VAR: &str = "CLINIC_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "CLINIC_LOG_LEVEL";

const DEFAULT_DB_PATH: &str = "clinic.db";

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClinicConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Maximum tracing level
    pub log_level: Level,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: Level::INFO,
        }
    }
}

impl ClinicConfig {
    /// Read configuration from the environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(env::var(DB_PATH_VAR).ok(), env::var(LOG_LEVEL_VAR).ok())
    }

    fn from_vars(db_path: Option<String>, log_level: Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(path) = db_path.filter(|p| !p.trim().is_empty()) {
            config.database_path = PathBuf::from(path);
        }
        if let Some(level) = log_level.filter(|l| !l.trim().is_empty()) {
            config.log_level = Level::from_str(level.trim())
                .with_context(|| format!("{} has unknown level '{}'", LOG_LEVEL_VAR, level))?;
        }
        Ok(config)
    }

    /// Install the fmt subscriber. Later calls leave the first one in place.
    pub fn init_tracing(&self) {
        let installed = tracing_subscriber::fmt()
            .with_max_level(self.log_level)
            .with_target(false)
            .try_init()
            .is_ok();
        if installed {
            tracing::debug!(level = %self.log_level, "Tracing initialised");
        }
    }
}
