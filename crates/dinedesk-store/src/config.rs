//! # Store Configuration
//!
//! Which backend to use and where local data lives.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                            │
//! │     DINEDESK_STORE_MODE=layered                                         │
//! │     DINEDESK_DATA_DIR=/var/lib/dinedesk                                 │
//! │                                                                         │
//! │  2. TOML Config File                                                    │
//! │     ~/.config/dinedesk/store.toml (Linux)                               │
//! │     ~/Library/Application Support/com.dinedesk.dinedesk/store.toml      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                    │
//! │     StoreMode::Layered, platform data dir                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # store.toml
//! mode = "layered"          # local | remote | layered
//! data_dir = "/var/lib/dinedesk"
//! tombstone_limit = 100
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Store Mode
// =============================================================================

/// Which backend(s) the app reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreMode {
    /// Device storage only.
    Local,

    /// Remote store only. Outages surface as errors.
    Remote,

    /// Remote authoritative, local write-through cache.
    #[default]
    Layered,
}

impl fmt::Display for StoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreMode::Local => write!(f, "local"),
            StoreMode::Remote => write!(f, "remote"),
            StoreMode::Layered => write!(f, "layered"),
        }
    }
}

impl FromStr for StoreMode {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "offline" => Ok(StoreMode::Local),
            "remote" | "cloud" => Ok(StoreMode::Remote),
            "layered" | "hybrid" => Ok(StoreMode::Layered),
            other => Err(StoreError::Config(format!(
                "Unknown store mode: '{}'. Valid options: local, remote, layered",
                other
            ))),
        }
    }
}

// =============================================================================
// Store Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub mode: StoreMode,

    /// Directory of the JSON file store.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Deleted-order tombstones kept before the oldest are pruned.
    #[serde(default = "default_tombstone_limit")]
    pub tombstone_limit: usize,
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "dinedesk", "dinedesk")
}

fn default_data_dir() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
}

fn default_tombstone_limit() -> usize {
    100
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            mode: StoreMode::default(),
            data_dir: default_data_dir(),
            tombstone_limit: default_tombstone_limit(),
        }
    }
}

impl StoreConfig {
    /// Configuration for a local store in `dir`, mostly for tests and tools.
    pub fn local(dir: impl Into<PathBuf>) -> Self {
        StoreConfig {
            mode: StoreMode::Local,
            data_dir: dir.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (store.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading store config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load store config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn from_file(path: &Path) -> StoreResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> StoreResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| StoreError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, toml::to_string_pretty(self)?)?;

        info!(?path, "Store config saved");
        Ok(())
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.tombstone_limit == 0 {
            return Err(StoreError::Config(
                "tombstone_limit must be greater than 0".into(),
            ));
        }

        if self.mode != StoreMode::Remote && self.data_dir.as_os_str().is_empty() {
            return Err(StoreError::Config(format!(
                "data_dir is required in {} mode",
                self.mode
            )));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(mode) = std::env::var("DINEDESK_STORE_MODE") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding store mode from environment");
                    self.mode = parsed;
                }
                Err(_) => warn!(mode = %mode, "Unknown store mode in environment"),
            }
        }

        if let Ok(dir) = std::env::var("DINEDESK_DATA_DIR") {
            debug!(dir = %dir, "Overriding data dir from environment");
            self.data_dir = PathBuf::from(dir);
        }

        if let Ok(limit) = std::env::var("DINEDESK_TOMBSTONE_LIMIT") {
            if let Ok(n) = limit.parse::<usize>() {
                self.tombstone_limit = n;
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("store.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_mode_parsing() {
        assert_eq!("local".parse::<StoreMode>().unwrap(), StoreMode::Local);
        assert_eq!("Cloud".parse::<StoreMode>().unwrap(), StoreMode::Remote);
        assert_eq!("hybrid".parse::<StoreMode>().unwrap(), StoreMode::Layered);
        assert!("sqlite".parse::<StoreMode>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.mode, StoreMode::Layered);
        assert_eq!(config.tombstone_limit, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = StoreConfig::default();
        config.tombstone_limit = 0;
        assert!(config.validate().is_err());

        config.tombstone_limit = 10;
        assert!(config.validate().is_ok());

        config.data_dir = PathBuf::new();
        assert!(config.validate().is_err());

        config.mode = StoreMode::Remote;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_roundtrip_and_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.toml");

        let config = StoreConfig::local(dir.path().join("data"));
        config.save(Some(path.clone())).unwrap();
        assert_eq!(StoreConfig::from_file(&path).unwrap(), config);

        std::fs::write(&path, "mode = \"remote\"\n").unwrap();
        let partial = StoreConfig::from_file(&path).unwrap();
        assert_eq!(partial.mode, StoreMode::Remote);
        assert_eq!(partial.tombstone_limit, 100);
    }

    #[test]
    fn test_older_file_with_retired_keys_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.toml");
        std::fs::write(
            &path,
            "mode = \"local\"\ntombstone_limit = 20\ncurrency_symbol = \"€\"\n",
        )
        .unwrap();

        let config = StoreConfig::from_file(&path).unwrap();
        assert_eq!(config.mode, StoreMode::Local);
        assert_eq!(config.tombstone_limit, 20);
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.toml");
        std::fs::write(&path, "mode = [").unwrap();
        assert!(matches!(
            StoreConfig::from_file(&path),
            Err(StoreError::Config(_))
        ));
    }
}
