//! Root configuration of the `valuator` binary.
//!
//! One JSON document holds every section; each section falls back to its
//! defaults when omitted, so an empty object is a valid config.
//!
//! ```json
//! {
//!   "observability": { "log_level": "warn", "log_format": "pretty" },
//!   "model": { "weights": [...], "reference": [...], "baseline_ebit_weight": 0.3 },
//!   "chart": { "headroom": 1.1, "zones": [...] },
//!   "earnout": { "initial_payment": 300, "min_price": 300, "max_price": 2025 },
//!   "linear": { "base_price": 800, "seller_income": 220 }
//! }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use valuator_common::config::{load_or_default, save_json_file};
use valuator_common::validation::collect;
use valuator_common::{config_path, ObservabilityConfig, Result, Validate, ValidationResult};
use valuator_core::{ChartConfig, EarnoutConfig, LinearModelConfig, ModelConfig};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub observability: ObservabilityConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub chart: ChartConfig,

    #[serde(default)]
    pub earnout: EarnoutConfig,

    #[serde(default)]
    pub linear: LinearModelConfig,
}

impl Config {
    /// Load from `path` (or the default location), then apply environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_path(path);
        let mut config: Self = load_or_default(&path)?;
        config.observability.apply_env_overrides();
        Ok(config)
    }

    /// Explicit path when given, otherwise `~/.valuator/config.json`.
    pub fn resolve_path(path: Option<&Path>) -> PathBuf {
        path.map_or_else(config_path, Path::to_path_buf)
    }

    /// Write this configuration as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        save_json_file(self, path)
    }
}

impl Validate for Config {
    fn validate(&self) -> ValidationResult<()> {
        collect([
            self.observability.validate(),
            self.model.validate(),
            self.chart.validate(),
            self.earnout.validate(),
            self.linear.validate(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use valuator_common::ValidationError;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let config: Config = load_or_default(&path).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "earnout": { "max_price": 2500 }, "observability": { "level": "debug" } }"#,
        )
        .unwrap();

        let config: Config = load_or_default(&path).unwrap();
        assert_eq!(config.earnout.max_price, 2500.0);
        assert_eq!(config.earnout.initial_payment, 300);
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.model, ModelConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.linear.base_price = 900;
        config.save(&path).unwrap();

        let loaded: Config = load_or_default(&path).unwrap();
        assert_eq!(loaded.linear.base_price, 900);
    }

    #[test]
    fn test_validation_collects_every_section() {
        let mut config = Config::default();
        config.observability.log_format = "xml".into();
        config.earnout.min_price = 5000.0;

        match config.validate() {
            Err(ValidationError::Multiple(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected two errors, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_path_prefers_explicit() {
        let explicit = Path::new("/tmp/custom.json");
        assert_eq!(Config::resolve_path(Some(explicit)), explicit);
        assert!(Config::resolve_path(None).ends_with("config.json"));
    }
}
