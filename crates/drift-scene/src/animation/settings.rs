//! Timing settings shared by animated properties and groups.

use serde::{Deserialize, Serialize};

use super::curve::Curve;
use crate::error::{AnimationError, Result};

/// Duration and curve for implicit animations.
///
/// Settings are replaced as a whole; changing them affects only runs that
/// start afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Run duration in milliseconds. Zero disables animation.
    pub duration_ms: f64,
    pub curve: Curve,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            duration_ms: 1000.0,
            curve: Curve::Linear,
        }
    }
}

impl AnimationSettings {
    pub fn new(duration_ms: f64, curve: Curve) -> Self {
        Self { duration_ms, curve }
    }

    /// Copy of these settings with a different duration.
    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Copy of these settings with a different curve.
    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }

    /// A zero duration means writes apply immediately.
    pub fn is_instant(&self) -> bool {
        self.duration_ms == 0.0
    }

    pub fn validate(&self) -> Result<()> {
        validate_duration(self.duration_ms)?;
        self.curve.validate()
    }
}

/// Reject negative or non-finite durations.
pub(crate) fn validate_duration(duration_ms: f64) -> Result<()> {
    if duration_ms.is_finite() && duration_ms >= 0.0 {
        Ok(())
    } else {
        Err(AnimationError::InvalidDuration(duration_ms))
    }
}

static_assertions::assert_impl_all!(AnimationSettings: Send, Sync, Copy);
static_assertions::assert_impl_all!(Curve: Send, Sync, Copy);
