//! Configuration file support for Oxydose.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/oxydose/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub limits: ValidationLimits,

    #[serde(default)]
    pub safety: SafetyThresholds,
}

/// Dose engine calibration constants
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Body weight the base MME values are calibrated to
    #[serde(default = "default_reference_weight_kg")]
    pub reference_weight_kg: f64,

    /// Fraction of the pre-adjuvant dose that adjuvants can never remove
    #[serde(default = "default_adjuvant_safety_limit_factor")]
    pub adjuvant_safety_limit_factor: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_weight_kg: default_reference_weight_kg(),
            adjuvant_safety_limit_factor: default_adjuvant_safety_limit_factor(),
        }
    }
}

/// Reference catalog source
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct CatalogConfig {
    /// TOML catalog replacing the built-in one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Accepted input ranges, checked before the engine runs
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ValidationLimits {
    #[serde(default = "default_min_age")]
    pub min_age: f64,
    #[serde(default = "default_max_age")]
    pub max_age: f64,
    #[serde(default = "default_min_weight_kg")]
    pub min_weight_kg: f64,
    #[serde(default = "default_max_weight_kg")]
    pub max_weight_kg: f64,
    #[serde(default = "default_min_height_cm")]
    pub min_height_cm: f64,
    #[serde(default = "default_max_height_cm")]
    pub max_height_cm: f64,
    #[serde(default = "default_min_bmi")]
    pub min_bmi: f64,
    #[serde(default = "default_max_bmi")]
    pub max_bmi: f64,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            min_age: default_min_age(),
            max_age: default_max_age(),
            min_weight_kg: default_min_weight_kg(),
            max_weight_kg: default_max_weight_kg(),
            min_height_cm: default_min_height_cm(),
            max_height_cm: default_max_height_cm(),
            min_bmi: default_min_bmi(),
            max_bmi: default_max_bmi(),
        }
    }
}

/// Thresholds for post-calculation safety alerts (doses in mg)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SafetyThresholds {
    #[serde(default = "default_high_dose_mg")]
    pub high_dose_mg: f64,
    #[serde(default = "default_dangerous_dose_mg")]
    pub dangerous_dose_mg: f64,
    #[serde(default = "default_elderly_age")]
    pub elderly_age: f64,
    #[serde(default = "default_elderly_max_dose_mg")]
    pub elderly_max_dose_mg: f64,
    #[serde(default = "default_renal_max_dose_mg")]
    pub renal_max_dose_mg: f64,
    #[serde(default = "default_sedative_count")]
    pub sedative_count: usize,
}

impl Default for SafetyThresholds {
    fn default() -> Self {
        Self {
            high_dose_mg: default_high_dose_mg(),
            dangerous_dose_mg: default_dangerous_dose_mg(),
            elderly_age: default_elderly_age(),
            elderly_max_dose_mg: default_elderly_max_dose_mg(),
            renal_max_dose_mg: default_renal_max_dose_mg(),
            sedative_count: default_sedative_count(),
        }
    }
}

// Default value functions
fn default_reference_weight_kg() -> f64 {
    70.0
}

fn default_adjuvant_safety_limit_factor() -> f64 {
    0.3
}

fn default_min_age() -> f64 {
    0.0
}

fn default_max_age() -> f64 {
    120.0
}

fn default_min_weight_kg() -> f64 {
    1.0
}

fn default_max_weight_kg() -> f64 {
    500.0
}

fn default_min_height_cm() -> f64 {
    30.0
}

fn default_max_height_cm() -> f64 {
    250.0
}

fn default_min_bmi() -> f64 {
    10.0
}

fn default_max_bmi() -> f64 {
    80.0
}

fn default_high_dose_mg() -> f64 {
    10.0
}

fn default_dangerous_dose_mg() -> f64 {
    30.0
}

fn default_elderly_age() -> f64 {
    80.0
}

fn default_elderly_max_dose_mg() -> f64 {
    10.0
}

fn default_renal_max_dose_mg() -> f64 {
    8.0
}

fn default_sedative_count() -> usize {
    2
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(config_path) if config_path.exists() => Self::load_from(&config_path),
            config_path => {
                tracing::info!(
                    "No config file found at {:?}, using defaults",
                    config_path
                );
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    ///
    /// `None` when the platform has no config directory (no HOME).
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|base| base.join("oxydose").join("config.toml"))
    }

    /// Reject calibration values that would break the engine's invariants
    pub fn validate(&self) -> Result<()> {
        let engine = &self.engine;
        if !(engine.reference_weight_kg.is_finite() && engine.reference_weight_kg > 0.0) {
            return Err(Error::Config(format!(
                "reference_weight_kg must be positive, got {}",
                engine.reference_weight_kg
            )));
        }
        if !(0.0..=1.0).contains(&engine.adjuvant_safety_limit_factor) {
            return Err(Error::Config(format!(
                "adjuvant_safety_limit_factor must be within [0, 1], got {}",
                engine.adjuvant_safety_limit_factor
            )));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.reference_weight_kg, 70.0);
        assert_eq!(config.engine.adjuvant_safety_limit_factor, 0.3);
        assert!(config.catalog.path.is_none());
        assert_eq!(config.limits.max_age, 120.0);
        assert_eq!(config.safety.dangerous_dose_mg, 30.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.catalog.path = Some(PathBuf::from("/etc/oxydose/catalog.toml"));

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[engine]
reference_weight_kg = 75.0

[safety]
renal_max_dose_mg = 6.0
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.engine.reference_weight_kg, 75.0);
        assert_eq!(config.engine.adjuvant_safety_limit_factor, 0.3); // default
        assert_eq!(config.safety.renal_max_dose_mg, 6.0);
        assert_eq!(config.safety.high_dose_mg, 10.0); // default
    }

    #[test]
    fn test_validate_rejects_bad_calibration() {
        let mut config = Config::default();
        config.engine.reference_weight_kg = 0.0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.engine.adjuvant_safety_limit_factor = 1.2;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.limits.max_weight_kg = 300.0;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.limits.max_weight_kg, 300.0);
    }
}
