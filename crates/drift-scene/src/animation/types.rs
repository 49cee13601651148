//! Core value and identifier types for the animation layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a timeline driven by the [`Scheduler`](super::Scheduler).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimelineId(pub u64);

impl TimelineId {
    /// Generate a new unique timeline ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for TimelineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TimelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timeline#{}", self.0)
    }
}

/// Visibility state of a node. Discrete: it has no in-between values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
    Collapsed,
}

/// A 2D point, used for positions and offsets.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height of a node's layout bounds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Drop shadow parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Shadow {
    pub offset_x: f64,
    pub offset_y: f64,
    pub radius: f64,
    /// RGBA color components.
    pub color: [f32; 4],
}

impl Shadow {
    /// Create a new shadow with the given parameters.
    pub fn new(offset_x: f64, offset_y: f64, radius: f64, color: [f32; 4]) -> Self {
        Self {
            offset_x,
            offset_y,
            radius,
            color,
        }
    }
}

/// A dynamically typed attribute value.
///
/// Hosts that store attributes generically can wrap their cells in this type
/// and still get implicit animation. Mixed-variant pairs and `Visibility`
/// cannot be interpolated; such changes apply immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimatableValue {
    /// Numeric value (opacity, width, rotation, ...).
    Scalar { value: f64 },
    /// RGBA color value.
    Color { rgba: [f32; 4] },
    /// Position or translation.
    Point {
        #[serde(flatten)]
        point: Point,
    },
    /// Drop shadow.
    Shadow {
        #[serde(flatten)]
        shadow: Shadow,
    },
    /// Visibility state.
    Visibility { value: Visibility },
}

impl AnimatableValue {
    /// Short name of the variant, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Scalar { .. } => "scalar",
            Self::Color { .. } => "color",
            Self::Point { .. } => "point",
            Self::Shadow { .. } => "shadow",
            Self::Visibility { .. } => "visibility",
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Scalar { value } => Some(*value),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<[f32; 4]> {
        match self {
            Self::Color { rgba } => Some(*rgba),
            _ => None,
        }
    }

    pub fn as_point(&self) -> Option<Point> {
        match self {
            Self::Point { point } => Some(*point),
            _ => None,
        }
    }

    pub fn as_shadow(&self) -> Option<Shadow> {
        match self {
            Self::Shadow { shadow } => Some(*shadow),
            _ => None,
        }
    }

    pub fn as_visibility(&self) -> Option<Visibility> {
        match self {
            Self::Visibility { value } => Some(*value),
            _ => None,
        }
    }
}

impl From<f64> for AnimatableValue {
    fn from(value: f64) -> Self {
        Self::Scalar { value }
    }
}

impl From<[f32; 4]> for AnimatableValue {
    fn from(rgba: [f32; 4]) -> Self {
        Self::Color { rgba }
    }
}

impl From<Point> for AnimatableValue {
    fn from(point: Point) -> Self {
        Self::Point { point }
    }
}

impl From<Shadow> for AnimatableValue {
    fn from(shadow: Shadow) -> Self {
        Self::Shadow { shadow }
    }
}

impl From<Visibility> for AnimatableValue {
    fn from(value: Visibility) -> Self {
        Self::Visibility { value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeline_id_uniqueness() {
        let id1 = TimelineId::new();
        let id2 = TimelineId::new();
        assert_ne!(id1, id2);
        assert!(id2 > id1);
    }

    #[test]
    fn test_value_accessors() {
        let value = AnimatableValue::from(0.5_f64);
        assert_eq!(value.as_f64(), Some(0.5));
        assert_eq!(value.as_color(), None);
        assert_eq!(value.kind_name(), "scalar");

        let value = AnimatableValue::from(Visibility::Hidden);
        assert_eq!(value.as_visibility(), Some(Visibility::Hidden));
        assert_eq!(value.kind_name(), "visibility");
    }

    #[test]
    fn test_value_serde_tagging() {
        let value = AnimatableValue::from(Point::new(1.0, 2.0));
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"type":"point","x":1.0,"y":2.0}"#);

        let parsed: AnimatableValue =
            serde_json::from_str(r#"{"type":"scalar","value":3.5}"#).unwrap();
        assert_eq!(parsed, AnimatableValue::Scalar { value: 3.5 });
    }
}
