//! Capability traits shared by properties, groups and containers.
//!
//! Animated things compose a few orthogonal capabilities: they can be paused
//! ([`Pausable`]), reconfigured ([`Customizable`]) and observed
//! ([`ListenableAnimation`]). [`GroupMember`] is the object-safe view an
//! [`AnimatedGroup`](super::AnimatedGroup) needs of its members.

use std::cell::Cell;
use std::rc::Rc;

use super::events::{AnimationEvent, LifecycleEvent};
use super::settings::AnimationSettings;
use crate::error::Result;

/// Host query: is the node an animation is attached to currently part of a
/// live scene? Writes to detached nodes are never animated.
pub trait Liveness {
    fn is_live(&self) -> bool;
}

impl<F: Fn() -> bool> Liveness for F {
    fn is_live(&self) -> bool {
        self()
    }
}

/// Shared liveness flag for hosts that track attachment with a boolean.
#[derive(Debug, Clone)]
pub struct LiveFlag(Rc<Cell<bool>>);

impl LiveFlag {
    pub fn new(live: bool) -> Self {
        Self(Rc::new(Cell::new(live)))
    }

    pub fn set(&self, live: bool) {
        self.0.set(live);
    }
}

impl Default for LiveFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Liveness for LiveFlag {
    fn is_live(&self) -> bool {
        self.0.get()
    }
}

/// Shared, rebindable paused flag.
///
/// Clones observe the same flag, which is how a group pauses every member at
/// once.
#[derive(Debug, Clone, Default)]
pub struct PausedFlag(Rc<Cell<bool>>);

impl PausedFlag {
    pub fn new(paused: bool) -> Self {
        Self(Rc::new(Cell::new(paused)))
    }

    pub fn get(&self) -> bool {
        self.0.get()
    }

    pub fn set(&self, paused: bool) {
        self.0.set(paused);
    }

    /// Whether both handles observe the same flag.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Something that can stop animating changes for a while.
///
/// Pausing never cancels a run in flight; it only affects what happens to the
/// next write.
pub trait Pausable {
    fn paused_flag(&self) -> PausedFlag;

    fn pause(&self) {
        self.paused_flag().set(true);
    }

    fn resume(&self) {
        self.paused_flag().set(false);
    }

    fn is_paused(&self) -> bool {
        self.paused_flag().get()
    }

    fn set_paused(&self, paused: bool) {
        self.paused_flag().set(paused);
    }
}

/// Something whose timing settings can be replaced.
pub trait Customizable {
    fn settings(&self) -> AnimationSettings;

    /// Replace the settings. Runs already in flight keep their old timing.
    fn set_settings(&self, settings: AnimationSettings) -> Result<()>;

    /// Derive new settings from the current ones.
    fn custom(&self, f: impl FnOnce(AnimationSettings) -> AnimationSettings) -> Result<()>
    where
        Self: Sized,
    {
        self.set_settings(f(self.settings()))
    }
}

/// Something that reports run lifecycle events. Handlers are additive.
pub trait ListenableAnimation {
    type Value;

    fn on_animation_started(&self, handler: impl Fn(&AnimationEvent<Self::Value>) + 'static);

    fn on_animation_ended(&self, handler: impl Fn(&AnimationEvent<Self::Value>) + 'static);
}

/// Type-erased handler receiving every member's lifecycle events.
pub type LifecycleHandler = Rc<dyn Fn(&LifecycleEvent)>;

/// What a group needs from a member, whatever its value type.
pub trait GroupMember {
    /// Observe `flag` instead of the member's own paused flag.
    fn bind_paused(&self, flag: PausedFlag);

    fn apply_settings(&self, settings: AnimationSettings) -> Result<()>;

    fn current_settings(&self) -> AnimationSettings;

    /// Attach to the group's node and start intercepting writes.
    fn attach(&self, liveness: Rc<dyn Liveness>) -> Result<()>;

    fn forward_lifecycle(&self, sink: LifecycleHandler);

    fn is_animating(&self) -> bool;

    fn dispose(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Toggle(PausedFlag);

    impl Pausable for Toggle {
        fn paused_flag(&self) -> PausedFlag {
            self.0.clone()
        }
    }

    #[test]
    fn test_paused_flag_is_shared() {
        let flag = PausedFlag::default();
        let other = flag.clone();
        other.set(true);
        assert!(flag.get());
        assert!(flag.ptr_eq(&other));
        assert!(!flag.ptr_eq(&PausedFlag::new(true)));
    }

    #[test]
    fn test_pausable_defaults() {
        let toggle = Toggle(PausedFlag::default());
        assert!(!toggle.is_paused());
        toggle.pause();
        assert!(toggle.is_paused());
        toggle.resume();
        assert!(!toggle.is_paused());
        toggle.set_paused(true);
        assert!(toggle.0.get());
    }

    #[test]
    fn test_liveness_impls() {
        let live = LiveFlag::default();
        let handle = live.clone();
        assert!(live.is_live());
        handle.set(false);
        assert!(!live.is_live());

        let never = || false;
        assert!(!never.is_live());
    }
}
