//! Configuration file handling.
//!
//! Every valuator binary reads a single JSON file, by default
//! `~/.valuator/config.json`. A missing file is not an error: all sections
//! fall back to their serde defaults.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (VALUATOR_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `VALUATOR_CONFIG_DIR` → directory holding `config.json`
//! - `VALUATOR_LOG_LEVEL` → observability.log_level
//! - `VALUATOR_LOG_FORMAT` → observability.log_format

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ResultExt};
use crate::validation::{Validate, ValidationError, ValidationResult};

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILE: &str = "config.json";

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("VALUATOR_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".valuator"),
        |dirs| dirs.home_dir().join(".valuator"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

/// Load a JSON file. Returns `None` if the file doesn't exist.
pub fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let content =
        fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;

    let value = serde_json::from_str(&content)
        .context(format!("Failed to parse {}", path.display()))?;

    Ok(Some(value))
}

/// Load a configuration file, falling back to defaults when it is absent.
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    match load_json_file(path)? {
        Some(value) => {
            tracing::debug!(path = %path.display(), "Loaded config file");
            Ok(value)
        }
        None => {
            tracing::info!(path = %path.display(), "Config file not found, using defaults");
            Ok(T::default())
        }
    }
}

/// Write a value as pretty JSON, creating parent directories as needed.
pub fn save_json_file<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)
                .context(format!("Failed to create config directory {}", dir.display()))?;
        }
    }

    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).context(format!("Failed to write config to {}", path.display()))
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Logging configuration shared by every binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level", alias = "level")]
    pub log_level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format", alias = "format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl ObservabilityConfig {
    /// Apply `VALUATOR_LOG_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("VALUATOR_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(format) = lookup("VALUATOR_LOG_FORMAT") {
            self.log_format = format;
        }
    }
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];
const LOG_FORMATS: &[&str] = &["pretty", "json"];

impl Validate for ObservabilityConfig {
    fn validate(&self) -> ValidationResult<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ValidationError::invalid(
                "observability.log_level",
                format!("must be one of {LOG_LEVELS:?}, got '{}'", self.log_level),
            ));
        }
        if !LOG_FORMATS.contains(&self.log_format.as_str()) {
            return Err(ValidationError::invalid(
                "observability.log_format",
                format!("must be one of {LOG_FORMATS:?}, got '{}'", self.log_format),
            ));
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "warn".into()
}
fn default_log_format() -> String {
    "pretty".into()
}
