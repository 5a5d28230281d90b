//! TOML-based environment configuration.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::render::TIME_FORMAT;

/// Top-level configuration parsed from TOML.
///
/// All fields have defaults matching the baseline environment. Load from
/// TOML with [`EnvConfig::from_toml_file`] or use `EnvConfig::default()`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvConfig {
    /// Simulation timing parameters.
    #[serde(default)]
    pub env: EnvSection,
    /// Rendering parameters.
    #[serde(default)]
    pub render: RenderSection,
}

/// Simulation timing parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnvSection {
    /// Interval between consecutive time steps, in minutes (must be > 0).
    pub timestep_minutes: u32,
    /// Master random seed for the bundled state source.
    pub seed: u64,
    /// Episode start timestamp, `YYYY-MM-DD HH:MM:SS`.
    pub episode_start: String,
}

impl Default for EnvSection {
    fn default() -> Self {
        Self {
            // 15 minutes mimics the management cadence of real
            // distribution networks.
            timestep_minutes: 15,
            seed: 42,
            episode_start: "2035-01-01 00:00:00".to_string(),
        }
    }
}

/// Rendering parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderSection {
    /// Pause between two visualization updates, in seconds (>= 0).
    pub sleep_time_s: f64,
    /// Port for the visualization backend (0 picks a free port).
    pub port: u16,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            sleep_time_s: 0.1,
            port: 0,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug)]
pub struct ConfigError {
    /// Dotted field path (e.g., `"env.timestep_minutes"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config error: {} — {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl EnvConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Parsed episode start timestamp, if valid.
    pub fn episode_start(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.env.episode_start, TIME_FORMAT).ok()
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if the configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.env.timestep_minutes == 0 {
            errors.push(ConfigError {
                field: "env.timestep_minutes".into(),
                message: "must be > 0".into(),
            });
        }
        if self.episode_start().is_none() {
            errors.push(ConfigError {
                field: "env.episode_start".into(),
                message: format!(
                    "\"{}\" does not match {TIME_FORMAT}",
                    self.env.episode_start
                ),
            });
        }
        if !(self.render.sleep_time_s >= 0.0 && self.render.sleep_time_s.is_finite()) {
            errors.push(ConfigError {
                field: "render.sleep_time_s".into(),
                message: "must be finite and >= 0".into(),
            });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = EnvConfig::default();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "default should be valid: {errors:?}");
        assert_eq!(cfg.env.timestep_minutes, 15);
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[env]
timestep_minutes = 30
seed = 7
episode_start = "2030-06-15 12:00:00"

[render]
sleep_time_s = 0.5
port = 8080
"#;
        let cfg = EnvConfig::from_toml_str(toml).expect("valid TOML should parse");
        assert_eq!(cfg.env.timestep_minutes, 30);
        assert_eq!(cfg.env.seed, 7);
        assert_eq!(cfg.render.port, 8080);
        assert!(cfg.episode_start().is_some());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let cfg = EnvConfig::from_toml_str("[env]\nseed = 99\n").expect("partial TOML");
        assert_eq!(cfg.env.seed, 99);
        assert_eq!(cfg.env.timestep_minutes, 15);
        assert_eq!(cfg.render.port, 0);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let result = EnvConfig::from_toml_str("[env]\nbogus = true\n");
        assert!(result.is_err());
    }

    #[test]
    fn validation_catches_zero_timestep() {
        let mut cfg = EnvConfig::default();
        cfg.env.timestep_minutes = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "env.timestep_minutes"));
    }

    #[test]
    fn validation_catches_bad_timestamp() {
        let mut cfg = EnvConfig::default();
        cfg.env.episode_start = "June 2035".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "env.episode_start"));
    }

    #[test]
    fn validation_catches_negative_sleep() {
        let mut cfg = EnvConfig::default();
        cfg.render.sleep_time_s = -1.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "render.sleep_time_s"));
    }
}
