//! Rune Motion configuration system
//!
//! This crate provides centralized configuration for the animation scheduler,
//! loading settings from `rune.toml` with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A setting is outside its allowed range.
    #[error("invalid setting `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RuneConfig {
    /// Animation timing settings
    pub animation: AnimationConfig,
    /// Logging settings
    pub logging: LoggingConfig,
}

/// Animation timing configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Force slow animations for every descriptor (debugging aid)
    pub use_slow_animations: bool,
    /// Multiplier applied to delay and duration of slow animations
    pub slow_factor: f64,
    /// Display refresh rate the frame-drop compensation assumes
    pub desired_fps: f64,
    /// Upper bound on virtual catch-up steps replayed per real frame
    pub max_catch_up_frames: u32,
    /// Registry allocations between two table compactions
    pub compaction_interval: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `env_logger` style filter, e.g. `rune_motion=debug`
    pub filter: Option<String>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            use_slow_animations: false,
            slow_factor: 3.0,
            desired_fps: 60.0,
            max_catch_up_frames: 4,
            compaction_interval: 20,
        }
    }
}

impl AnimationConfig {
    /// Duration of one display frame in milliseconds.
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.desired_fps
    }

    /// Check that every setting is usable by the scheduler.
    pub fn validate(&self) -> Result<()> {
        if !(self.desired_fps.is_finite() && self.desired_fps > 0.0) {
            return Err(ConfigError::Invalid {
                key: "animation.desired_fps",
                reason: format!("must be a positive number, got {}", self.desired_fps),
            });
        }
        if !(self.slow_factor.is_finite() && self.slow_factor > 0.0) {
            return Err(ConfigError::Invalid {
                key: "animation.slow_factor",
                reason: format!("must be a positive number, got {}", self.slow_factor),
            });
        }
        if self.compaction_interval == 0 {
            return Err(ConfigError::Invalid {
                key: "animation.compaction_interval",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

fn env_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

impl RuneConfig {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the rune.toml configuration file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.animation.validate()?;
        Ok(config)
    }

    /// Load configuration from the default location (rune.toml in the current directory)
    /// or return default configuration if file doesn't exist
    pub fn load_or_default() -> Self {
        Self::load_from_file("rune.toml").unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    /// Unparseable numeric values are ignored.
    pub fn merge_with_env(&mut self) {
        if let Ok(val) = std::env::var("RUNE_SLOW_ANIMATIONS") {
            self.animation.use_slow_animations = env_flag(&val);
        }
        if let Ok(val) = std::env::var("RUNE_SLOW_FACTOR") {
            if let Ok(factor) = val.parse::<f64>() {
                self.animation.slow_factor = factor;
            }
        }
        if let Ok(val) = std::env::var("RUNE_DESIRED_FPS") {
            if let Ok(fps) = val.parse::<f64>() {
                self.animation.desired_fps = fps;
            }
        }
        if let Ok(val) = std::env::var("RUNE_MAX_CATCH_UP_FRAMES") {
            if let Ok(frames) = val.parse::<u32>() {
                self.animation.max_catch_up_frames = frames;
            }
        }
        if let Ok(val) = std::env::var("RUNE_COMPACTION_INTERVAL") {
            if let Ok(interval) = val.parse::<u64>() {
                self.animation.compaction_interval = interval;
            }
        }

        if let Ok(filter) = std::env::var("RUNE_LOG") {
            self.logging.filter = Some(filter);
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// This is the recommended way to load configuration:
    /// 1. Load from rune.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    /// 3. Validate; invalid overrides fall back to the defaults
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        if config.animation.validate().is_err() {
            config.animation = AnimationConfig::default();
        }
        config
    }
}
