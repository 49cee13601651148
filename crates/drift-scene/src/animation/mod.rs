//! Implicit property animation.
//!
//! This module provides:
//! - **Curves**: named easing functions and custom cubic beziers
//! - **Cells**: the observable values animations intercept
//! - **Properties**: per-cell interception and interpolation
//! - **Groups**: several properties of one node controlled together
//! - **Scheduler**: the frame pulse and deferred-work queue everything runs on
//!
//! # Architecture
//!
//! ```text
//! ValueCell ──write──▶ AnimationProperty ──schedule──▶ Scheduler
//!     ▲                      │                            │
//!     └──── revert / frames ─┘◀────────── tick ───────────┘
//!
//! AnimatedGroup
//!   └── GroupMember (AnimationProperty<T> for any T)
//! ```

pub mod capability;
pub mod cell;
pub mod curve;
pub mod events;
pub mod group;
pub mod interpolate;
pub mod property;
pub mod scheduler;
pub mod settings;
pub mod types;

pub use capability::{
    Customizable, GroupMember, LifecycleHandler, ListenableAnimation, LiveFlag, Liveness, Pausable,
    PausedFlag,
};
pub use cell::{Listener, ObservableCell, SubscriptionId, ValueCell};
pub use curve::Curve;
pub use events::{AnimationEvent, AnimationEventKind, EventHandler, EventQueue, LifecycleEvent};
pub use group::AnimatedGroup;
pub use interpolate::{Animatable, Interpolate};
pub use property::AnimationProperty;
pub use scheduler::{Scheduler, TimelineStatus};
pub use settings::AnimationSettings;
pub use types::{AnimatableValue, Point, Shadow, Size, TimelineId, Visibility};
