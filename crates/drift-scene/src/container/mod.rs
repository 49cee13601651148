//! Animated containers.
//!
//! ```text
//! ChildList ──ListChange──▶ ContainerReflow ──play──▶ TransitionAnimation (entrance / exit)
//!                                 │
//!                                 └──relocate──▶ sibling translate cells
//!
//! ChildSlot ──(old, new)──▶ Switcher ──play──▶ TransitionAnimation (entrance / exit)
//!     │
//!     └──(old, new)──▶ OnDemandProperty ──rebuild──▶ AnimationProperty on the new child
//! ```

pub mod element;
pub mod list;
pub mod node;
pub mod on_demand;
pub mod reflow;
pub mod slot;
pub mod switcher;
pub mod transition;

pub use element::{Element, ElementId, ElementRef, Orientation};
pub use list::{ChildList, ListChange, ListListener};
pub use node::SceneNode;
pub use on_demand::OnDemandProperty;
pub use reflow::{ContainerReflow, ReflowConfig};
pub use slot::{ChildSlot, SlotListener};
pub use switcher::Switcher;
pub use transition::{Effect, Fade, NoEffect, TransitionAnimation};
