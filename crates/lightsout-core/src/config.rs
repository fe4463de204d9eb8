//! Configuration loading and typed config structures.
//!
//! Configuration is read from a YAML file whose structure mirrors
//! [`LightsOutConfig`]. Every field has a default, so an empty file (or no
//! file at all) produces the standard start procedure:
//!
//! ```yaml
//! race:
//!   light_delay:
//!     min_seconds: 0.8
//!     max_seconds: 1.0
//!   lights_out_delay:
//!     min_seconds: 0.8
//!     max_seconds: 1.2
//!   event_capacity: 32
//! leaderboard:
//!   path: "leaderboard.csv"
//! ```
//!
//! The number of lights and the leaderboard size are fixed by the rules of
//! the game and are not configurable.

use core::time::Duration;
use std::path::{Path, PathBuf};

use lightsout_leaderboard::{CsvFileStore, Leaderboard};
use serde::Deserialize;

use crate::random::RandomSource;

/// Environment variable that overrides `leaderboard.path`.
pub const LEADERBOARD_PATH_ENV: &str = "LIGHTSOUT_LEADERBOARD_PATH";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but describes an impossible setup.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LightsOutConfig {
    /// Start sequence timing.
    #[serde(default)]
    pub race: RaceConfig,

    /// Leaderboard storage.
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
}

impl LightsOutConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `LIGHTSOUT_LEADERBOARD_PATH` overrides `leaderboard.path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (normally the process environment).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(LEADERBOARD_PATH_ENV).filter(|p| !p.is_empty()) {
            self.leaderboard.path = PathBuf::from(path);
        }
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.race.light_delay.validate("race.light_delay")?;
        self.race.lights_out_delay.validate("race.lights_out_delay")?;
        if self.race.event_capacity == 0 {
            return Err(ConfigError::Invalid {
                reason: "race.event_capacity must be at least 1".to_owned(),
            });
        }
        if self.leaderboard.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                reason: "leaderboard.path must not be empty".to_owned(),
            });
        }
        Ok(())
    }
}

/// Start sequence timing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RaceConfig {
    /// Delay before each of the five lights comes on.
    #[serde(default = "default_light_delay")]
    pub light_delay: DelayRange,

    /// Hold time with all five lights on before they go out.
    #[serde(default = "default_lights_out_delay")]
    pub lights_out_delay: DelayRange,

    /// Buffered race events per subscriber before slow subscribers lag.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            light_delay: default_light_delay(),
            lights_out_delay: default_lights_out_delay(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// A half-open range of delays, `[min_seconds, max_seconds)`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DelayRange {
    /// Inclusive lower bound in seconds.
    pub min_seconds: f64,
    /// Exclusive upper bound in seconds.
    pub max_seconds: f64,
}

impl DelayRange {
    /// Build a range. Call [`validate`](Self::validate) before use.
    pub const fn new(min_seconds: f64, max_seconds: f64) -> Self {
        Self {
            min_seconds,
            max_seconds,
        }
    }

    /// Draw a delay from `random`.
    pub fn sample(&self, random: &mut impl RandomSource) -> Duration {
        let seconds = random.uniform(self.min_seconds, self.max_seconds);
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
    }

    fn validate(&self, field: &str) -> Result<(), ConfigError> {
        if !self.min_seconds.is_finite() || !self.max_seconds.is_finite() {
            return Err(ConfigError::Invalid {
                reason: format!("{field} bounds must be finite"),
            });
        }
        if self.min_seconds < 0.0 {
            return Err(ConfigError::Invalid {
                reason: format!("{field}.min_seconds must not be negative"),
            });
        }
        if self.min_seconds >= self.max_seconds {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "{field}.min_seconds ({}) must be below max_seconds ({})",
                    self.min_seconds, self.max_seconds
                ),
            });
        }
        Ok(())
    }
}

/// Leaderboard storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LeaderboardConfig {
    /// CSV file holding the top ten.
    #[serde(default = "default_leaderboard_path")]
    pub path: PathBuf,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            path: default_leaderboard_path(),
        }
    }
}

impl LeaderboardConfig {
    /// A leaderboard over the configured CSV file.
    pub fn open(&self) -> Leaderboard<CsvFileStore> {
        Leaderboard::new(CsvFileStore::new(&self.path))
    }
}

const fn default_light_delay() -> DelayRange {
    DelayRange::new(0.8, 1.0)
}

const fn default_lights_out_delay() -> DelayRange {
    DelayRange::new(0.8, 1.2)
}

const fn default_event_capacity() -> usize {
    32
}

fn default_leaderboard_path() -> PathBuf {
    PathBuf::from("leaderboard.csv")
}
