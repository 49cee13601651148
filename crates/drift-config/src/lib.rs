//! Drift configuration system
//!
//! Settings are read from `drift.toml` and may be overridden by `DRIFT_*`
//! environment variables. Every section is optional; missing keys keep
//! their defaults.
#![doc = concat!("\n```toml\n", include_str!("../drift.example.toml"), "```")]

use std::path::Path;
use std::str::FromStr;

use drift_scene::{AnimationSettings, Curve, Orientation, ReflowConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// File looked up in the current directory by [`DriftConfig::load`].
pub const DEFAULT_FILE: &str = "drift.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Defaults for implicit property animations
    pub animation: AnimationSettings,
    /// Layout and relocation of animated containers
    pub container: ReflowConfig,
    /// Frame pacing for drivers that pump the scheduler
    pub frame: FrameConfig,
}

/// Frame pacing configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Clock advance per pulse
    pub interval_ms: f64,
    /// Upper bound on pulses when running until idle
    pub max_frames: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            interval_ms: 16.0,
            max_frames: 1000,
        }
    }
}

impl DriftConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Load from `path`, or return defaults if the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is still an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Self::load_from_file(path.as_ref()) {
            Err(ConfigError::Read(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.as_ref().display(), "no config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Merge with the process environment.
    ///
    /// Environment variables take precedence over file values.
    pub fn merge_with_env(&mut self) {
        self.merge_with_vars(|key| std::env::var(key).ok());
    }

    /// Merge with variables resolved by `lookup`.
    ///
    /// Values that do not parse are logged and ignored.
    pub fn merge_with_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ms) = parse_var::<f64>(&lookup, "DRIFT_DURATION_MS") {
            self.animation.duration_ms = ms;
        }
        if let Some(curve) = parse_var::<Curve>(&lookup, "DRIFT_CURVE") {
            self.animation.curve = curve;
        }
        if let Some(orientation) = parse_var::<Orientation>(&lookup, "DRIFT_ORIENTATION") {
            self.container.orientation = orientation;
        }
        if let Some(spacing) = parse_var::<f64>(&lookup, "DRIFT_SPACING") {
            self.container.spacing = spacing;
        }
        if let Some(curve) = parse_var::<Curve>(&lookup, "DRIFT_RELOCATION_CURVE") {
            self.container.relocation_curve = curve;
        }
        if let Some(raw) = lookup("DRIFT_RELOCATION_MS") {
            // "auto" follows the entrance/exit duration again.
            if raw.trim().eq_ignore_ascii_case("auto") {
                self.container.relocation_duration_ms = None;
            } else if let Some(ms) = parse_value::<f64>("DRIFT_RELOCATION_MS", &raw) {
                self.container.relocation_duration_ms = Some(ms);
            }
        }
        if let Some(ms) = parse_var::<f64>(&lookup, "DRIFT_FRAME_MS") {
            self.frame.interval_ms = ms;
        }
        if let Some(frames) = parse_var::<usize>(&lookup, "DRIFT_MAX_FRAMES") {
            self.frame.max_frames = frames;
        }
    }

    /// Check every value the animation core would reject, plus frame pacing.
    pub fn validate(&self) -> Result<()> {
        self.animation
            .validate()
            .map_err(|err| ConfigError::Invalid(format!("animation: {err}")))?;
        self.container
            .validate()
            .map_err(|err| ConfigError::Invalid(format!("container: {err}")))?;
        if !(self.frame.interval_ms.is_finite() && self.frame.interval_ms > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "frame: interval_ms must be positive, got {}",
                self.frame.interval_ms
            )));
        }
        if self.frame.max_frames == 0 {
            return Err(ConfigError::Invalid("frame: max_frames must be at least 1".into()));
        }
        Ok(())
    }

    /// Load with environment overrides and validate.
    ///
    /// 1. Load from `drift.toml` (or use defaults if not found)
    /// 2. Override with environment variables if present
    /// 3. Reject values the animation core cannot use
    pub fn load() -> Result<Self> {
        let mut config = Self::load_or_default(DEFAULT_FILE)?;
        config.merge_with_env();
        config.validate()?;
        Ok(config)
    }

    pub fn animation_settings(&self) -> AnimationSettings {
        self.animation
    }

    pub fn reflow_config(&self) -> ReflowConfig {
        self.container
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    parse_value(key, &raw)
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Option<T> {
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = raw, "ignoring unparsable override");
            None
        }
    }
}
