//! Configuration loading and typed config structures for the simulation.
//!
//! The canonical configuration lives in `tickworld-config.yaml` at the
//! project root. Every field has a default, so a missing file, a missing
//! section or a missing key all fall back to the values below.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::retry::RetryPolicy;

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

    /// A value parsed but is out of range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending key.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Grid and timing settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// AI controller settings.
    #[serde(default)]
    pub ai: AiConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
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

    /// Parse and validate configuration from a YAML string.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: &str| {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_owned(),
            })
        };
        if self.world.width == 0 || self.world.height == 0 {
            return invalid("world.width/height", "the grid must have at least one cell");
        }
        if self.world.tick_rate_hz == 0 {
            return invalid("world.tick_rate_hz", "must be positive");
        }
        if !(self.world.walk_speed.is_finite() && self.world.walk_speed > 0.0) {
            return invalid("world.walk_speed", "must be a positive number");
        }
        if self.ai.max_attempts == 0 {
            return invalid("ai.max_attempts", "at least one attempt is required");
        }
        if self.ai.base_delay_ms > self.ai.max_delay_ms {
            return invalid("ai.base_delay_ms", "must not exceed ai.max_delay_ms");
        }
        Ok(())
    }
}

/// Grid and timing configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Grid width in cells.
    #[serde(default = "default_width")]
    pub width: u32,

    /// Grid height in cells.
    #[serde(default = "default_height")]
    pub height: u32,

    /// Ticks per second of the engine loop.
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,

    /// Walking speed in cells per second.
    #[serde(default = "default_walk_speed")]
    pub walk_speed: f64,

    /// Stop after this many ticks; 0 runs until the goal is reached.
    #[serde(default)]
    pub max_ticks: u64,
}

impl WorldConfig {
    /// Simulated seconds per tick.
    pub fn tick_seconds(&self) -> f64 {
        1.0 / f64::from(self.tick_rate_hz.max(1))
    }

    /// Real time between ticks.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1)
            .checked_div(self.tick_rate_hz.max(1))
            .unwrap_or(Duration::from_secs(1))
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            tick_rate_hz: default_tick_rate_hz(),
            walk_speed: default_walk_speed(),
            max_ticks: 0,
        }
    }
}

/// AI controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AiConfig {
    /// Attempts per external call before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the first retry, in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound on any single backoff, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Consecutive failed turns before a controller stalls.
    #[serde(default = "default_max_failed_turns")]
    pub max_failed_turns: u32,
}

impl AiConfig {
    /// The retry policy for external calls.
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_failed_turns: default_max_failed_turns(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG`
    /// is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_width() -> u32 {
    32
}

const fn default_height() -> u32 {
    20
}

const fn default_tick_rate_hz() -> u32 {
    30
}

const fn default_walk_speed() -> f64 {
    10.0
}

const fn default_max_attempts() -> u32 {
    4
}

const fn default_base_delay_ms() -> u64 {
    500
}

const fn default_max_delay_ms() -> u64 {
    8_000
}

const fn default_max_failed_turns() -> u32 {
    3
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.world.width, 32);
        assert_eq!(config.world.tick_rate_hz, 30);
        assert_eq!(config.ai.max_attempts, 4);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn parse_partial_yaml_fills_defaults() {
        let yaml = r"
world:
  width: 16
  max_ticks: 600
ai:
  base_delay_ms: 100
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.world.width, 16);
        assert_eq!(config.world.height, 20);
        assert_eq!(config.world.max_ticks, 600);
        assert_eq!(config.ai.base_delay_ms, 100);
        assert_eq!(config.ai.max_delay_ms, 8_000);
        assert!(!config.logging.json);
    }

    #[test]
    fn empty_yaml_is_default() {
        let config = SimulationConfig::parse("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let err = SimulationConfig::parse("world:\n  tick_rate_hz: 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "world.tick_rate_hz",
                ..
            }
        ));
        assert!(SimulationConfig::parse("ai:\n  max_attempts: 0\n").is_err());
    }

    #[test]
    fn retry_policy_from_config() {
        let policy = AiConfig::default().retry_policy();
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.base_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(8));
    }

    #[test]
    fn tick_timing() {
        let world = WorldConfig::default();
        assert_eq!(Some(world.tick_interval()), Duration::from_secs(1).checked_div(30));
        assert!((world.tick_seconds() - 1.0 / 30.0).abs() < 1e-12);
    }
}
