//! Error types for drift-scene.

use thiserror::Error;

use crate::container::ElementId;

/// Result alias for animation configuration operations.
pub type Result<T> = std::result::Result<T, AnimationError>;

/// Configuration errors reported synchronously by the animation layer.
///
/// The steady-state animation path never fails; these only surface when a
/// property, group or reflow engine is built or reconfigured.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    #[error("invalid duration: {0}ms (must be finite and non-negative)")]
    InvalidDuration(f64),

    #[error("invalid speed: {0} (must be finite and positive)")]
    InvalidSpeed(f64),

    #[error("invalid cycle count: {0} (must be at least 1)")]
    InvalidCycleCount(u32),

    #[error("invalid spacing: {0} (must be finite and non-negative)")]
    InvalidSpacing(f64),

    #[error("invalid curve: {0}")]
    InvalidCurve(String),

    #[error("value type `{0}` cannot be interpolated")]
    UnsupportedValueType(&'static str),

    #[error("animation listener is already registered")]
    AlreadyRegistered,

    #[error("animation property has been disposed")]
    Disposed,

    #[error("switcher already has a child; use set_child to replace it")]
    ChildAlreadySet,
}

/// Errors from mutating a [`ChildList`](crate::container::ChildList).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    #[error("index {index} out of bounds for list of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("element {0} is already in the list")]
    DuplicateElement(ElementId),
}
