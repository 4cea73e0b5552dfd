//! Configuration file support for Taper.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/taper/config.toml`.

use crate::types::ExerciseSpec;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub forecast: ForecastConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub exercises: ExercisesConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Forecast window configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Horizon used when `series` is run without an explicit one
    #[serde(default = "default_horizon_days")]
    pub default_horizon_days: i64,

    /// Horizons the CLI accepts for `--horizon`
    #[serde(default = "default_horizon_choices")]
    pub horizon_choices: Vec<i64>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_horizon_days: default_horizon_days(),
            horizon_choices: default_horizon_choices(),
        }
    }
}

impl ForecastConfig {
    /// Check a requested horizon against the configured choices
    pub fn validate_horizon(&self, days: i64) -> Result<()> {
        if self.horizon_choices.contains(&days) {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "horizon {} days is not one of the configured choices {:?}",
                days, self.horizon_choices
            )))
        }
    }
}

/// Presentation configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Decimal places used when formatting amounts for display
    #[serde(default = "default_decimals")]
    pub decimals: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            decimals: default_decimals(),
        }
    }
}

/// User-defined exercise catalog additions
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct ExercisesConfig {
    #[serde(default)]
    pub custom: Vec<ExerciseSpec>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").expect("HOME environment variable not set");
        PathBuf::from(home).join(".local/share")
    });
    base.join("taper")
}

fn default_horizon_days() -> i64 {
    30
}

fn default_horizon_choices() -> Vec<i64> {
    vec![7, 14, 30, 60, 90]
}

fn default_decimals() -> usize {
    2
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
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
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").expect("HOME environment variable not set");
            PathBuf::from(home).join(".config")
        });
        base.join("taper").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Check config invariants that serde defaults can't express
    fn validate(&self) -> Result<()> {
        if self.forecast.default_horizon_days <= 0 {
            return Err(Error::Config(
                "forecast.default_horizon_days must be positive".into(),
            ));
        }
        if self.forecast.horizon_choices.is_empty() {
            return Err(Error::Config(
                "forecast.horizon_choices must not be empty".into(),
            ));
        }
        if self.forecast.horizon_choices.iter().any(|&d| d <= 0) {
            return Err(Error::Config(
                "forecast.horizon_choices must all be positive".into(),
            ));
        }
        if !self
            .forecast
            .horizon_choices
            .contains(&self.forecast.default_horizon_days)
        {
            return Err(Error::Config(format!(
                "forecast.default_horizon_days ({}) must be one of horizon_choices {:?}",
                self.forecast.default_horizon_days, self.forecast.horizon_choices
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.forecast.default_horizon_days, 30);
        assert_eq!(config.forecast.horizon_choices, vec![7, 14, 30, 60, 90]);
        assert_eq!(config.display.decimals, 2);
        assert!(config.exercises.custom.is_empty());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(
            config.forecast.default_horizon_days,
            parsed.forecast.default_horizon_days
        );
        assert_eq!(config.display.decimals, parsed.display.decimals);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[forecast]
default_horizon_days = 14
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.forecast.default_horizon_days, 14);
        assert_eq!(config.display.decimals, 2); // default
    }

    #[test]
    fn test_validate_horizon() {
        let forecast = ForecastConfig::default();
        assert!(forecast.validate_horizon(30).is_ok());
        assert!(forecast.validate_horizon(45).is_err());
    }

    #[test]
    fn test_default_horizon_must_be_a_choice() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[forecast]
default_horizon_days = 45
"#,
        )
        .unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
