//! Implicit animation for retained-mode scene graphs.
//!
//! Writes to an animated attribute are intercepted and replaced by a smooth
//! transition from the old value to the new one; ordered containers animate
//! insertions and removals while their remaining children slide into place,
//! and single-child switchers animate replacing their child.
//!
//! Everything runs on one thread, driven by a [`Scheduler`]: call
//! [`Scheduler::advance`] once per frame.

pub mod animation;
pub mod container;
pub mod error;

pub use animation::{
    AnimatableValue, AnimatedGroup, AnimationEvent, AnimationEventKind, AnimationProperty,
    AnimationSettings, Customizable, Curve, EventQueue, GroupMember, Interpolate, LifecycleEvent,
    ListenableAnimation, LiveFlag, Liveness, ObservableCell, Pausable, PausedFlag, Point,
    Scheduler, Size, TimelineId, ValueCell,
};
pub use container::{
    ChildList, ChildSlot, ContainerReflow, Effect, Element, ElementId, ElementRef, Fade,
    ListChange, NoEffect, OnDemandProperty, Orientation, ReflowConfig, SceneNode, Switcher,
    TransitionAnimation,
};
pub use error::{AnimationError, ListError, Result};
