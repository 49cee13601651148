//! Interpolation between attribute values.
//!
//! The engine never interpolates time directly: a run evaluates its curve and
//! feeds the eased progress into [`Interpolate::interpolate`]. Eased progress
//! can leave `[0, 1]` for overshooting curves, so implementations extrapolate
//! instead of clamping.

use std::fmt;

use super::types::{AnimatableValue, Point, Shadow, Size};

/// Trait for values that can be blended between two endpoints.
pub trait Interpolate: Sized {
    /// Interpolate between self and `to`.
    ///
    /// When t = 0.0, returns self.
    /// When t = 1.0, returns `to`.
    fn interpolate(&self, to: &Self, t: f64) -> Self;

    /// Whether this value has in-between states at all.
    fn is_interpolable(&self) -> bool {
        true
    }

    /// Whether a change from `self` to `to` can be animated.
    fn can_interpolate_to(&self, to: &Self) -> bool {
        self.is_interpolable() && to.is_interpolable()
    }

    /// Name of the value type, used in diagnostics.
    fn type_label(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Bound for values an [`AnimationProperty`](super::AnimationProperty) can drive.
pub trait Animatable: Interpolate + Clone + PartialEq + fmt::Debug + 'static {}

impl<T> Animatable for T where T: Interpolate + Clone + PartialEq + fmt::Debug + 'static {}

#[inline]
fn lerp_f64(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

#[inline]
fn lerp_f32(from: f32, to: f32, t: f64) -> f32 {
    from + (to - from) * t as f32
}

impl Interpolate for f64 {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        lerp_f64(*self, *to, t)
    }
}

impl Interpolate for f32 {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        lerp_f32(*self, *to, t)
    }
}

impl Interpolate for i32 {
    /// Rounds to the nearest integer.
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        lerp_f64(*self as f64, *to as f64, t).round() as i32
    }
}

impl Interpolate for i64 {
    /// Rounds to the nearest integer.
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        lerp_f64(*self as f64, *to as f64, t).round() as i64
    }
}

impl Interpolate for [f32; 4] {
    /// Per-component RGBA blend.
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        [
            lerp_f32(self[0], to[0], t),
            lerp_f32(self[1], to[1], t),
            lerp_f32(self[2], to[2], t),
            lerp_f32(self[3], to[3], t),
        ]
    }
}

impl Interpolate for Point {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        Self {
            x: lerp_f64(self.x, to.x, t),
            y: lerp_f64(self.y, to.y, t),
        }
    }
}

impl Interpolate for Size {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        Self {
            width: lerp_f64(self.width, to.width, t),
            height: lerp_f64(self.height, to.height, t),
        }
    }
}

impl Interpolate for Shadow {
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        Self {
            offset_x: lerp_f64(self.offset_x, to.offset_x, t),
            offset_y: lerp_f64(self.offset_y, to.offset_y, t),
            radius: lerp_f64(self.radius, to.radius, t).max(0.0),
            color: self.color.interpolate(&to.color, t),
        }
    }
}

impl Interpolate for AnimatableValue {
    /// Both values must be the same variant; otherwise `self` is returned
    /// unchanged. Callers check [`Interpolate::can_interpolate_to`] first.
    fn interpolate(&self, to: &Self, t: f64) -> Self {
        match (self, to) {
            (Self::Scalar { value: from }, Self::Scalar { value: to }) => Self::Scalar {
                value: from.interpolate(to, t),
            },
            (Self::Color { rgba: from }, Self::Color { rgba: to }) => Self::Color {
                rgba: from.interpolate(to, t),
            },
            (Self::Point { point: from }, Self::Point { point: to }) => Self::Point {
                point: from.interpolate(to, t),
            },
            (Self::Shadow { shadow: from }, Self::Shadow { shadow: to }) => Self::Shadow {
                shadow: from.interpolate(to, t),
            },
            _ => self.clone(),
        }
    }

    fn is_interpolable(&self) -> bool {
        !matches!(self, Self::Visibility { .. })
    }

    fn can_interpolate_to(&self, to: &Self) -> bool {
        self.is_interpolable() && std::mem::discriminant(self) == std::mem::discriminant(to)
    }

    fn type_label(&self) -> &'static str {
        self.kind_name()
    }
}
