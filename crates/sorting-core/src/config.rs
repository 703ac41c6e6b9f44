//! Configuration System
//!
//! Model parameters and run settings, loadable from a TOML file so sweeps can
//! be adjusted without recompiling. Every section and field is optional.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use sorting_events::ParamsRecord;

use crate::error::{ConfigurationError, LoadError};
use crate::state::Dimensions;

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "sorting.toml";

/// Top-level configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelParams,
    pub run: RunConfig,
}

/// Parameters of the model itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Number of fixed-trait values (groups)
    pub k: u32,
    /// Number of values per flexible-trait coordinate
    pub m: u32,
    /// Number of flexible-trait coordinates per agent
    pub n: usize,
    /// Population size; a perfect square unless a custom network is supplied
    pub n_agents: usize,
    /// Fraction of interlocutors drawn from the whole population
    pub gamma: f64,
    /// Homophily exponent applied to similarity weights
    pub h: f64,
    /// Weight of a fixed-trait match relative to one flexible-trait match
    pub c: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            k: 2,
            m: 10,
            n: 4,
            n_agents: 100,
            gamma: 0.0,
            h: 8.0,
            c: 1.0,
        }
    }
}

impl ModelParams {
    /// Check every parameter; grid-shape checks happen when the torus is built.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        Dimensions::from(self).validate()?;

        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ConfigurationError::InvalidProbability {
                name: "gamma",
                value: self.gamma,
            });
        }
        if !self.h.is_finite() || self.h < 0.0 {
            return Err(ConfigurationError::InvalidExponent { value: self.h });
        }
        if !self.c.is_finite() || self.c < 0.0 {
            return Err(ConfigurationError::InvalidWeight {
                name: "c",
                value: self.c,
            });
        }
        Ok(())
    }
}

impl ModelParams {
    /// Plain record of these parameters for run reports.
    pub fn to_record(&self) -> ParamsRecord {
        ParamsRecord {
            k: self.k,
            m: self.m,
            n: self.n,
            n_agents: self.n_agents,
            gamma: self.gamma,
            h: self.h,
            c: self.c,
        }
    }
}

/// How a driver steps the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Upper bound on interaction steps
    pub steps: u64,
    /// Stop once this many consecutive no-op steps per agent have passed
    pub break_after_stagnant: Option<u64>,
    /// Seed for the single random source
    pub seed: u64,
    /// Steps between recorded sorting samples
    pub sample_interval: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            steps: 100_000,
            break_after_stagnant: Some(10),
            seed: 42,
            sample_interval: 1_000,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, LoadError> {
        let config: Config = toml::from_str(content)?;
        config.model.validate()?;
        Ok(config)
    }

    /// Returns the configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, LoadError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.k, 2);
        assert_eq!(config.model.m, 10);
        assert_eq!(config.model.n_agents, 100);
        assert_eq!(config.run.break_after_stagnant, Some(10));
        assert!(config.model.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_str(
            r#"
            [model]
            gamma = 0.25
            n_agents = 49
            "#,
        )
        .unwrap();

        assert_eq!(config.model.gamma, 0.25);
        assert_eq!(config.model.n_agents, 49);
        assert_eq!(config.model.h, 8.0);
        assert_eq!(config.run, RunConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Config::from_str("[model]\ngamma = 1.5\n").unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid(ConfigurationError::InvalidProbability { name: "gamma", .. })
        ));

        let err = Config::from_str("[model]\nk = 0\n").unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid(ConfigurationError::InvalidDimension { name: "k", value: 0 })
        ));

        let err = Config::from_str("[model]\nh = -1.0\n").unwrap_err();
        assert!(matches!(
            err,
            LoadError::Invalid(ConfigurationError::InvalidExponent { .. })
        ));
    }

    #[test]
    fn test_malformed_toml() {
        let err = Config::from_str("[model\n").unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[run]\nsteps = 500\nseed = 9\n[model]\nc = 0.0").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.run.steps, 500);
        assert_eq!(config.run.seed, 9);
        assert_eq!(config.model.c, 0.0);
    }

    #[test]
    fn test_missing_file() {
        let err = Config::load("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let config = Config::default();
        let text = config.to_toml().unwrap();
        assert_eq!(Config::from_str(&text).unwrap(), config);
    }
}
