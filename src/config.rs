//! Configuration for sensor-merge.

use crate::core::Tolerance;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for batch merging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Folder scanned for Sensor Logger archives
    pub input_dir: PathBuf,

    /// Where combined tables are written
    pub output_dir: PathBuf,

    /// Glob pattern selecting archives inside `input_dir`
    pub pattern: String,

    /// Maximum timestamp distance for a gyroscope match
    #[serde(rename = "tolerance_ms", with = "tolerance_ms_serde")]
    pub tolerance: Tolerance,

    /// Number of archives processed concurrently
    pub jobs: usize,

    /// Path for storing cumulative processing statistics
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sensor-merge");

        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("./data/test"),
            pattern: "*.zip".to_string(),
            tolerance: Tolerance::default(),
            jobs: 1,
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, falling back to defaults when absent.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content =
                std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sensor-merge")
            .join("config.json")
    }

    /// Path of the persisted processing statistics.
    pub fn history_path(&self) -> PathBuf {
        self.data_path.join("history.json")
    }

    /// Reject settings a batch run cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs == 0 {
            return Err(ConfigError::InvalidValue("jobs must be at least 1".into()));
        }
        if self.pattern.trim().is_empty() {
            return Err(ConfigError::InvalidValue("pattern must not be empty".into()));
        }
        Ok(())
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidValue(e) => write!(f, "Invalid value: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Tolerance as fractional milliseconds.
mod tolerance_ms_serde {
    use crate::core::Tolerance;
    use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(tolerance: &Tolerance, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        tolerance.as_millis_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Tolerance, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = f64::deserialize(deserializer)?;
        Tolerance::from_millis(millis).map_err(D::Error::custom)
    }
}
