//! The element contract containers animate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::animation::{Liveness, Size, ValueCell};

/// Stable identity of an element, independent of its position in a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

impl ElementId {
    /// Generate a new unique element ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

/// Layout axis of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    #[default]
    Vertical,
}

impl Orientation {
    /// Extent of `size` along this axis.
    pub fn extent(self, size: Size) -> f64 {
        match self {
            Self::Horizontal => size.width,
            Self::Vertical => size.height,
        }
    }
}

impl std::str::FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "horizontal" => Ok(Self::Horizontal),
            "vertical" => Ok(Self::Vertical),
            other => Err(format!("unknown orientation `{other}`")),
        }
    }
}

/// A node that can live in an animated container.
///
/// Translation along an axis is a visual offset on top of the layout
/// position; containers animate it while siblings relocate.
pub trait Element: Liveness {
    fn id(&self) -> ElementId;

    /// Current layout bounds.
    fn size(&self) -> Size;

    /// Translation cell for `orientation`'s axis (X for horizontal, Y for vertical).
    fn translate(&self, orientation: Orientation) -> ValueCell<f64>;

    fn opacity(&self) -> ValueCell<f64>;
}

/// Shared element handle, as stored in a [`ChildList`](super::ChildList).
pub type ElementRef = Rc<dyn Element>;
