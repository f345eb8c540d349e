//! # Engine Configuration
//!
//! Settings are read from `attendance.yaml`. Every key is optional; a missing
//! file means all defaults.
//!
//! ```yaml
//! window_size: 5
//! notification_ttl_secs: 5
//! data_directory: "./attendance-data"
//! recorded_by: "Front office"
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::date_range::DEFAULT_WINDOW_SIZE;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "attendance.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of days shown in the grid, anchor date included
    pub window_size: usize,
    /// How long error and info messages stay on screen
    pub notification_ttl_secs: u64,
    /// Where the CSV gateway keeps its files
    pub data_directory: PathBuf,
    /// Attribution sent with writes when the caller doesn't give one
    pub recorded_by: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            notification_ttl_secs: 5,
            data_directory: PathBuf::from("./attendance-data"),
            recorded_by: None,
        }
    }
}

impl EngineConfig {
    /// Load from `path`, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let yaml = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&yaml)?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = if yaml.trim().is_empty() {
            EngineConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::Invalid(
                "window_size must be at least 1".to_string(),
            ));
        }
        if self.notification_ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "notification_ttl_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn notification_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.notification_ttl_secs as i64)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.window_size, 5);
        assert_eq!(config.notification_ttl(), chrono::Duration::seconds(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config = EngineConfig::from_yaml_str("window_size: 7\nrecorded_by: Front office\n").unwrap();
        assert_eq!(config.window_size, 7);
        assert_eq!(config.notification_ttl_secs, 5);
        assert_eq!(config.recorded_by.as_deref(), Some("Front office"));
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(EngineConfig::from_yaml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_zero_window_is_invalid() {
        assert!(matches!(
            EngineConfig::from_yaml_str("window_size: 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            EngineConfig::from_yaml_str("notification_ttl_secs: 0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        assert!(matches!(
            EngineConfig::from_yaml_str("window_size: [five]"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = EngineConfig::load(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_yaml_round_trip_through_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let config = EngineConfig {
            window_size: 3,
            recorded_by: Some("Mr. Okafor".to_string()),
            ..EngineConfig::default()
        };
        fs::write(&path, config.to_yaml().unwrap()).unwrap();

        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }
}
