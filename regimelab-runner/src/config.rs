//! `regimelab.toml`: file locations and per-regime overrides.
//!
//! Every key is optional. Relative paths are resolved against the directory
//! holding the config file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use regimelab_core::regime::{RegimeClassifier, RegimePreset};

pub const DEFAULT_CONFIG_FILE: &str = "regimelab.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Indicator matrix (`.csv` or `.parquet`).
    pub indicators: PathBuf,
    /// `indicators_metadata.csv`, the preferred catalog source.
    pub metadata: PathBuf,
    pub models_dir: PathBuf,
    pub regimes_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            indicators: PathBuf::from("data/indicators/indicators_full.csv"),
            metadata: PathBuf::from("data/indicators/indicators_metadata.csv"),
            models_dir: PathBuf::from("models"),
            regimes_dir: PathBuf::from("data/processed/regimes"),
        }
    }
}

/// Per-classifier parameter overrides (`[regime.<name>]`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegimeOverride {
    pub upper_threshold: Option<f64>,
    pub lower_threshold: Option<f64>,
    pub min_periods: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimelabConfig {
    pub paths: PathsConfig,
    pub regime: BTreeMap<String, RegimeOverride>,
}

impl RegimelabConfig {
    /// Load a config file and resolve its relative paths.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.resolved_against(base))
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// An explicit path must exist. Without one, `regimelab.toml` in the
    /// working directory is used when present, defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let known: Vec<String> = RegimePreset::builtin()
            .iter()
            .map(|p| p.name().to_string())
            .collect();
        for (name, o) in &self.regime {
            if !known.contains(name) {
                return Err(ConfigError::Invalid(format!(
                    "[regime.{name}]: unknown regime (known: {})",
                    known.join(", ")
                )));
            }
            let upper = o.upper_threshold.unwrap_or(f64::INFINITY);
            let lower = o.lower_threshold.unwrap_or(f64::NEG_INFINITY);
            if o.upper_threshold.is_some_and(f64::is_nan)
                || o.lower_threshold.is_some_and(f64::is_nan)
                || lower > upper
            {
                return Err(ConfigError::Invalid(format!(
                    "[regime.{name}]: lower_threshold must not exceed upper_threshold"
                )));
            }
            if o.min_periods == Some(0) {
                return Err(ConfigError::Invalid(format!(
                    "[regime.{name}]: min_periods must be at least 1"
                )));
            }
        }
        Ok(())
    }

    fn resolved_against(mut self, base: &Path) -> Self {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.paths.indicators);
        resolve(&mut self.paths.metadata);
        resolve(&mut self.paths.models_dir);
        resolve(&mut self.paths.regimes_dir);
        self
    }

    /// Built-in regime presets with this config's overrides applied.
    pub fn regime_presets(&self) -> Vec<RegimePreset> {
        RegimePreset::builtin()
            .into_iter()
            .map(|preset| {
                let name = preset.name().to_string();
                match self.regime.get(&name) {
                    None => preset,
                    Some(o) => {
                        let defaults = preset.thresholds();
                        let min_periods = o.min_periods.unwrap_or(preset.min_periods());
                        preset
                            .with_thresholds(
                                o.upper_threshold.unwrap_or(defaults.upper),
                                o.lower_threshold.unwrap_or(defaults.lower),
                            )
                            .with_min_periods(min_periods)
                    }
                }
            })
            .collect()
    }
}
