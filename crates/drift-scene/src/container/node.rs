//! Minimal scene node.

use std::cell::Cell;
use std::fmt;

use crate::animation::{Liveness, Size, ValueCell};

use super::element::{Element, ElementId, Orientation};

/// A named rectangle with translation and opacity cells.
///
/// Stands in for a host scene-graph node: enough state for containers and
/// animated properties to work against, no layout or rendering.
pub struct SceneNode {
    id: ElementId,
    name: String,
    size: Cell<Size>,
    translate_x: ValueCell<f64>,
    translate_y: ValueCell<f64>,
    opacity: ValueCell<f64>,
    live: Cell<bool>,
}

impl SceneNode {
    pub fn new(name: impl Into<String>, size: Size) -> Self {
        Self {
            id: ElementId::new(),
            name: name.into(),
            size: Cell::new(size),
            translate_x: ValueCell::new(0.0),
            translate_y: ValueCell::new(0.0),
            opacity: ValueCell::new(1.0),
            live: Cell::new(true),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_size(&self, size: Size) {
        self.size.set(size);
    }

    pub fn translate_x(&self) -> ValueCell<f64> {
        self.translate_x.clone()
    }

    pub fn translate_y(&self) -> ValueCell<f64> {
        self.translate_y.clone()
    }

    /// Mark the node attached to or detached from a live scene.
    pub fn set_live(&self, live: bool) {
        self.live.set(live);
    }
}

impl Liveness for SceneNode {
    fn is_live(&self) -> bool {
        self.live.get()
    }
}

impl Element for SceneNode {
    fn id(&self) -> ElementId {
        self.id
    }

    fn size(&self) -> Size {
        self.size.get()
    }

    fn translate(&self, orientation: Orientation) -> ValueCell<f64> {
        match orientation {
            Orientation::Horizontal => self.translate_x(),
            Orientation::Vertical => self.translate_y(),
        }
    }

    fn opacity(&self) -> ValueCell<f64> {
        self.opacity.clone()
    }
}

impl fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("size", &self.size.get())
            .field("translate", &(self.translate_x.get(), self.translate_y.get()))
            .field("opacity", &self.opacity.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_axis() {
        let node = SceneNode::new("row", Size::new(100.0, 20.0));
        node.translate(Orientation::Vertical).set(-5.0);
        assert_eq!(node.translate_y().get(), -5.0);
        assert_eq!(node.translate_x().get(), 0.0);
        assert_eq!(node.opacity().get(), 1.0);
    }

    #[test]
    fn test_liveness_and_size() {
        let node = SceneNode::new("row", Size::new(100.0, 20.0));
        assert!(node.is_live());
        node.set_live(false);
        assert!(!node.is_live());

        node.set_size(Size::new(50.0, 30.0));
        assert_eq!(node.size().height, 30.0);
        assert_eq!(node.name(), "row");
    }
}
