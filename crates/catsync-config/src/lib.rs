//! # catsync-config
//!
//! Layered configuration loading for catsync using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`CATSYNC_*` prefix, `__` as separator)
//! 2. Project-level `catsync.toml`
//! 3. User-level `~/.config/catsync/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `CATSYNC_SYNC__BATCH_SIZE` -> `sync.batch_size`,
//! `CATSYNC_DATABASE__PATH` -> `database.path`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use catsync_config::CatsyncConfig;
//!
//! let config = CatsyncConfig::load_with_dotenv().expect("config");
//! println!("catalog at {}", config.database.path);
//! ```

mod database;
mod error;
mod source;
mod sync;

pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use source::SourceConfig;
pub use sync::SyncConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project-local config file name.
pub const LOCAL_CONFIG_FILE: &str = "catsync.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatsyncConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl CatsyncConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`. Use [`Self::load_with_dotenv`] for `.env` support.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a provider fails to parse or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration after reading `.env` from the current directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a provider fails to parse or a value is invalid.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Load configuration with an explicit TOML file layered above the
    /// project-local one and below the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file does not exist, a provider fails to
    /// parse, or a value is invalid.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(invalid("--config", &format!("{} is not a file", path.display())));
        }
        let _ = dotenvy::dotenv();
        let config: Self = Self::layered(Some(path)).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or layer extra providers.
    #[must_use]
    pub fn figment() -> Figment {
        Self::layered(None)
    }

    fn layered(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Layer 1: User-global config
        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        // Layer 2: Project-local config
        let local_path = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // Layer 3: --config file
        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        // Layer 4: Environment variables (highest priority)
        figment.merge(Env::prefixed("CATSYNC_").split("__"))
    }

    /// Reject values the sync engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sync.batch_size == 0 {
            return Err(invalid("sync.batch_size", "must be at least 1"));
        }
        if !self.sync.price_tolerance.is_finite() || self.sync.price_tolerance < 0.0 {
            return Err(invalid(
                "sync.price_tolerance",
                "must be a finite, non-negative number",
            ));
        }
        if self.sync.sync_type.trim().is_empty() {
            return Err(invalid("sync.sync_type", "must not be empty"));
        }
        for (field, value) in [
            ("source.key_field", &self.source.key_field),
            ("source.description_field", &self.source.description_field),
            ("source.price_field", &self.source.price_field),
        ] {
            if value.trim().is_empty() {
                return Err(invalid(field, "must name a source column"));
            }
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("catsync").join("config.toml"))
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
