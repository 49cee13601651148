//! Easing curves for animation timing.
//!
//! A [`Curve`] maps linear progress in `[0, 1]` to eased progress. Every curve
//! starts at 0 and ends at 1; the back, elastic and bounce families may leave
//! `[0, 1]` in between.
//!
//! The named curves follow the usual easings.net formulas. [`Curve::CubicBezier`]
//! accepts CSS-style control points for anything else.
//!
//! # Usage
//!
//! ```
//! use drift_scene::animation::Curve;
//!
//! let progress = Curve::EaseInOut.evaluate(0.5);
//! assert!((progress - 0.5).abs() < 1e-9);
//!
//! let material = Curve::cubic_bezier(0.4, 0.0, 0.2, 1.0).unwrap();
//! assert!(material.evaluate(0.5) > 0.5);
//! ```

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::error::{AnimationError, Result};

const BACK_C1: f64 = 1.70158;
const BACK_C2: f64 = BACK_C1 * 1.525;
const BACK_C3: f64 = BACK_C1 + 1.0;
const ELASTIC_C4: f64 = (2.0 * PI) / 3.0;
const ELASTIC_C5: f64 = (2.0 * PI) / 4.5;
const BOUNCE_N1: f64 = 7.5625;
const BOUNCE_D1: f64 = 2.75;

/// Easing curve for animation timing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    /// Constant rate.
    #[default]
    Linear,

    /// Cubic deceleration.
    EaseOut,
    EaseOutSine,
    EaseOutExpo,
    /// Overshoots the target, then settles back.
    EaseOutBack,
    EaseOutBounce,
    EaseOutElastic,

    /// Cubic acceleration.
    EaseIn,
    EaseInSine,
    EaseInExpo,
    /// Pulls back below the start before accelerating.
    EaseInBack,
    EaseInBounce,
    EaseInElastic,

    /// Cubic acceleration, then deceleration.
    EaseInOut,
    EaseInOutSine,
    EaseInOutExpo,
    EaseInOutBack,
    EaseInOutBounce,
    EaseInOutElastic,

    /// Custom cubic bezier curve with control points `(x1, y1)` and `(x2, y2)`.
    /// x values must be in [0, 1], y values can be any finite number.
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Curve {
    /// Every named curve, in declaration order.
    pub const ALL: [Curve; 19] = [
        Curve::Linear,
        Curve::EaseOut,
        Curve::EaseOutSine,
        Curve::EaseOutExpo,
        Curve::EaseOutBack,
        Curve::EaseOutBounce,
        Curve::EaseOutElastic,
        Curve::EaseIn,
        Curve::EaseInSine,
        Curve::EaseInExpo,
        Curve::EaseInBack,
        Curve::EaseInBounce,
        Curve::EaseInElastic,
        Curve::EaseInOut,
        Curve::EaseInOutSine,
        Curve::EaseInOutExpo,
        Curve::EaseInOutBack,
        Curve::EaseInOutBounce,
        Curve::EaseInOutElastic,
    ];

    /// Evaluate the curve at the given progress.
    ///
    /// `t` is clamped to `[0, 1]` first. The result is exactly 0 at `t = 0`
    /// and exactly 1 at `t = 1` for every named curve.
    pub fn evaluate(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);

        match *self {
            Self::Linear => t,

            Self::EaseOut => 1.0 - (1.0 - t).powi(3),
            Self::EaseOutSine => (t * PI / 2.0).sin(),
            Self::EaseOutExpo => {
                if t >= 1.0 {
                    1.0
                } else {
                    1.0 - 2f64.powf(-10.0 * t)
                }
            }
            Self::EaseOutBack => 1.0 + BACK_C3 * (t - 1.0).powi(3) + BACK_C1 * (t - 1.0).powi(2),
            Self::EaseOutBounce => bounce_out(t),
            Self::EaseOutElastic => elastic_out(t),

            Self::EaseIn => t * t * t,
            Self::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            Self::EaseInExpo => {
                if t <= 0.0 {
                    0.0
                } else {
                    2f64.powf(10.0 * t - 10.0)
                }
            }
            Self::EaseInBack => BACK_C3 * t * t * t - BACK_C1 * t * t,
            Self::EaseInBounce => 1.0 - bounce_out(1.0 - t),
            Self::EaseInElastic => elastic_in(t),

            Self::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Self::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Self::EaseInOutExpo => expo_in_out(t),
            Self::EaseInOutBack => {
                if t < 0.5 {
                    ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2) + 2.0)
                        / 2.0
                }
            }
            Self::EaseInOutBounce => {
                if t < 0.5 {
                    (1.0 - bounce_out(1.0 - 2.0 * t)) / 2.0
                } else {
                    (1.0 + bounce_out(2.0 * t - 1.0)) / 2.0
                }
            }
            Self::EaseInOutElastic => elastic_in_out(t),

            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(x1, y1, x2, y2, t),
        }
    }

    /// Create a custom cubic bezier curve.
    ///
    /// Fails with [`AnimationError::InvalidCurve`] if `x1` or `x2` is outside
    /// `[0, 1]` or any control point is not finite.
    pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self> {
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return Err(AnimationError::InvalidCurve(format!(
                "bezier control points must be finite, got ({x1}, {y1}, {x2}, {y2})"
            )));
        }
        if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
            return Err(AnimationError::InvalidCurve(format!(
                "bezier x values must be in [0, 1], got x1={x1}, x2={x2}"
            )));
        }
        Ok(Self::CubicBezier { x1, y1, x2, y2 })
    }

    /// Check a curve that may have been deserialized rather than built
    /// through [`Curve::cubic_bezier`].
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::CubicBezier { x1, y1, x2, y2 } => Self::cubic_bezier(x1, y1, x2, y2).map(|_| ()),
            _ => Ok(()),
        }
    }

    /// The `snake_case` name used in configuration files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseOut => "ease_out",
            Self::EaseOutSine => "ease_out_sine",
            Self::EaseOutExpo => "ease_out_expo",
            Self::EaseOutBack => "ease_out_back",
            Self::EaseOutBounce => "ease_out_bounce",
            Self::EaseOutElastic => "ease_out_elastic",
            Self::EaseIn => "ease_in",
            Self::EaseInSine => "ease_in_sine",
            Self::EaseInExpo => "ease_in_expo",
            Self::EaseInBack => "ease_in_back",
            Self::EaseInBounce => "ease_in_bounce",
            Self::EaseInElastic => "ease_in_elastic",
            Self::EaseInOut => "ease_in_out",
            Self::EaseInOutSine => "ease_in_out_sine",
            Self::EaseInOutExpo => "ease_in_out_expo",
            Self::EaseInOutBack => "ease_in_out_back",
            Self::EaseInOutBounce => "ease_in_out_bounce",
            Self::EaseInOutElastic => "ease_in_out_elastic",
            Self::CubicBezier { .. } => "cubic_bezier",
        }
    }

    /// Whether the curve can leave `[0, 1]` between its endpoints.
    pub fn overshoots(&self) -> bool {
        match *self {
            Self::EaseOutBack
            | Self::EaseInBack
            | Self::EaseInOutBack
            | Self::EaseOutElastic
            | Self::EaseInElastic
            | Self::EaseInOutElastic => true,
            Self::CubicBezier { y1, y2, .. } => !(0.0..=1.0).contains(&y1) || !(0.0..=1.0).contains(&y2),
            _ => false,
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::CubicBezier { x1, y1, x2, y2 } => {
                write!(f, "cubic_bezier({x1}, {y1}, {x2}, {y2})")
            }
            _ => f.write_str(self.name()),
        }
    }
}

impl FromStr for Curve {
    type Err = AnimationError;

    /// Parse a named curve. Accepts `snake_case` and `kebab-case`, any case.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .iter()
            .copied()
            .find(|curve| curve.name() == normalized)
            .ok_or_else(|| AnimationError::InvalidCurve(format!("unknown curve name `{s}`")))
    }
}

fn bounce_out(t: f64) -> f64 {
    if t < 1.0 / BOUNCE_D1 {
        BOUNCE_N1 * t * t
    } else if t < 2.0 / BOUNCE_D1 {
        let t = t - 1.5 / BOUNCE_D1;
        BOUNCE_N1 * t * t + 0.75
    } else if t < 2.5 / BOUNCE_D1 {
        let t = t - 2.25 / BOUNCE_D1;
        BOUNCE_N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / BOUNCE_D1;
        BOUNCE_N1 * t * t + 0.984375
    }
}

fn elastic_in(t: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else {
        -(2f64.powf(10.0 * t - 10.0)) * ((t * 10.0 - 10.75) * ELASTIC_C4).sin()
    }
}

fn elastic_out(t: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else {
        2f64.powf(-10.0 * t) * ((t * 10.0 - 0.75) * ELASTIC_C4).sin() + 1.0
    }
}

fn elastic_in_out(t: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else if t < 0.5 {
        -(2f64.powf(20.0 * t - 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0
    } else {
        (2f64.powf(-20.0 * t + 10.0) * ((20.0 * t - 11.125) * ELASTIC_C5).sin()) / 2.0 + 1.0
    }
}

fn expo_in_out(t: f64) -> f64 {
    if t <= 0.0 {
        0.0
    } else if t >= 1.0 {
        1.0
    } else if t < 0.5 {
        2f64.powf(20.0 * t - 10.0) / 2.0
    } else {
        (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
    }
}

/// Evaluate a cubic bezier curve at the given progress.
///
/// Newton-Raphson finds the curve parameter whose x matches `progress`; the
/// y at that parameter is the eased value.
fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64, progress: f64) -> f64 {
    if progress <= 0.0 {
        return 0.0;
    }
    if progress >= 1.0 {
        return 1.0;
    }

    let t = solve_bezier_x(x1, x2, progress);
    bezier_component(y1, y2, t)
}

fn solve_bezier_x(x1: f64, x2: f64, target_x: f64) -> f64 {
    let mut t = target_x;

    for _ in 0..8 {
        let x = bezier_component(x1, x2, t) - target_x;
        if x.abs() < 1e-7 {
            break;
        }

        let dx = bezier_derivative(x1, x2, t);
        if dx.abs() < 1e-7 {
            break;
        }

        t = (t - x / dx).clamp(0.0, 1.0);
    }

    t
}

/// One coordinate of the bezier curve at parameter t:
/// `3(1-t)²t·p1 + 3(1-t)t²·p2 + t³`
#[inline]
fn bezier_component(p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t
}

/// `3(1-t)²·p1 + 6(1-t)t·(p2-p1) + 3t²·(1-p2)`
#[inline]
fn bezier_derivative(p1: f64, p2: f64, t: f64) -> f64 {
    let mt = 1.0 - t;
    3.0 * mt * mt * p1 + 6.0 * mt * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}
