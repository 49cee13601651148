//! Single-child container that animates swaps.
//!
//! A [`Switcher`] shows one child at a time. Replacing the child plays the
//! exit animation on the old one and the entrance animation on the new one
//! at the same time; the old child stays among the switcher's children until
//! its exit finishes.
//!
//! ```
//! use std::rc::Rc;
//! use drift_scene::{ElementRef, Scheduler, SceneNode, Size, Switcher};
//!
//! let scheduler = Scheduler::new();
//! let switcher = Switcher::fade(&scheduler, 200.0)?;
//! let first: ElementRef = Rc::new(SceneNode::new("first", Size::new(100.0, 40.0)));
//! let second: ElementRef = Rc::new(SceneNode::new("second", Size::new(100.0, 40.0)));
//!
//! switcher.of(first.clone())?;
//! switcher.set_child(Some(second.clone()));
//! assert_eq!(switcher.children().len(), 2);
//!
//! scheduler.run_until_idle(16.0, 100);
//! assert_eq!(switcher.children().ids(), vec![second.id()]);
//! # Ok::<(), drift_scene::AnimationError>(())
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use crate::animation::{Pausable, PausedFlag, Scheduler, SubscriptionId, TimelineId};
use crate::error::{AnimationError, Result};

use super::element::{ElementId, ElementRef};
use super::list::ChildList;
use super::slot::ChildSlot;
use super::transition::{Fade, TransitionAnimation};

struct SwitcherInner {
    children: ChildList,
    slot: ChildSlot,
    scheduler: Scheduler,
    entrance: Option<TransitionAnimation>,
    exit: Option<TransitionAnimation>,
    paused: PausedFlag,
    /// Set while the initial child is installed without animation.
    quiet: Cell<bool>,
    entrances: RefCell<HashMap<ElementId, TimelineId>>,
    exits: RefCell<HashMap<ElementId, TimelineId>>,
    subscription: Cell<Option<SubscriptionId>>,
    disposed: Cell<bool>,
}

/// Animated single-child container.
///
/// Dropping the switcher (or calling [`dispose`](Self::dispose)) cancels its
/// animations: exiting children are removed and the current child is left in
/// its entered state.
pub struct Switcher {
    inner: Rc<SwitcherInner>,
}

impl Switcher {
    pub fn new(
        scheduler: &Scheduler,
        entrance: Option<TransitionAnimation>,
        exit: Option<TransitionAnimation>,
    ) -> Result<Self> {
        for animation in entrance.iter().chain(exit.iter()) {
            animation.validate()?;
        }

        let inner = Rc::new(SwitcherInner {
            children: ChildList::new(),
            slot: ChildSlot::new(),
            scheduler: scheduler.clone(),
            entrance,
            exit,
            paused: PausedFlag::default(),
            quiet: Cell::new(false),
            entrances: RefCell::new(HashMap::new()),
            exits: RefCell::new(HashMap::new()),
            subscription: Cell::new(None),
            disposed: Cell::new(false),
        });

        let weak: Weak<SwitcherInner> = Rc::downgrade(&inner);
        let id = inner.slot.subscribe(Rc::new(
            move |old: Option<&ElementRef>, new: Option<&ElementRef>| {
                if let Some(inner) = weak.upgrade() {
                    inner.on_swap(old, new);
                }
            },
        ));
        inner.subscription.set(Some(id));

        Ok(Self { inner })
    }

    /// Cross-fade: fade in the new child while the old one fades out.
    pub fn fade(scheduler: &Scheduler, duration_ms: f64) -> Result<Self> {
        Self::new(
            scheduler,
            Some(TransitionAnimation::new(Fade::fade_in(duration_ms))),
            Some(TransitionAnimation::new(Fade::fade_out(duration_ms))),
        )
    }

    /// Install the initial child without playing any animation.
    ///
    /// Fails with [`AnimationError::ChildAlreadySet`] if there is a child
    /// already.
    pub fn of(&self, child: ElementRef) -> Result<()> {
        if !self.inner.slot.is_empty() {
            return Err(AnimationError::ChildAlreadySet);
        }
        let id = child.id();
        let exit = self.inner.exits.borrow_mut().remove(&id);
        if let Some(timeline) = exit {
            self.inner.scheduler.cancel(timeline);
            if let Some(exit) = self.inner.exit.as_ref() {
                exit.effect().apply(&*child, 0.0);
            }
        }
        if !self.inner.children.contains(id) {
            if let Err(err) = self.inner.children.push(Rc::clone(&child)) {
                warn!(%id, %err, "could not show initial child");
            }
        }
        self.inner.quiet.set(true);
        self.inner.slot.set(Some(child));
        self.inner.quiet.set(false);
        Ok(())
    }

    /// Replace the child, animating the swap.
    pub fn set_child(&self, child: Option<ElementRef>) {
        self.inner.slot.set(child);
    }

    pub fn child(&self) -> Option<ElementRef> {
        self.inner.slot.get()
    }

    /// Handle to the wrapped child, for observers that follow it.
    pub fn child_slot(&self) -> &ChildSlot {
        &self.inner.slot
    }

    /// Everything currently shown: the child plus any exiting ones.
    pub fn children(&self) -> &ChildList {
        &self.inner.children
    }

    pub fn is_transitioning(&self) -> bool {
        !self.inner.entrances.borrow().is_empty() || !self.inner.exits.borrow().is_empty()
    }

    pub fn dispose(&self) {
        self.inner.teardown();
    }
}

impl SwitcherInner {
    fn on_swap(self: &Rc<Self>, old: Option<&ElementRef>, new: Option<&ElementRef>) {
        if self.disposed.get() || self.quiet.get() {
            return;
        }
        let animate = !self.paused.get();

        if let Some(new) = new {
            self.enter(new, animate);
        }
        if let Some(old) = old {
            self.leave(old, animate);
        }
        debug!(
            old = ?old.map(|e| e.id()),
            new = ?new.map(|e| e.id()),
            animate,
            "switcher child replaced"
        );
    }

    fn enter(self: &Rc<Self>, element: &ElementRef, animate: bool) {
        let id = element.id();
        let exit = self.exits.borrow_mut().remove(&id);
        if let Some(timeline) = exit {
            self.scheduler.cancel(timeline);
            trace!(%id, "exit interrupted by re-entry");
        }
        if !self.children.contains(id) {
            if let Err(err) = self.children.push(Rc::clone(element)) {
                warn!(%id, %err, "could not show new child");
                return;
            }
        }
        let Some(entrance) = self.entrance.as_ref() else {
            return;
        };
        if !animate {
            entrance.effect().finish(&**element);
            return;
        }

        let weak = Rc::downgrade(self);
        let timeline = entrance.play(
            Rc::clone(element),
            &self.scheduler,
            Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.entrances.borrow_mut().remove(&id);
                }
            })),
        );
        let previous = self.entrances.borrow_mut().insert(id, timeline);
        if let Some(previous) = previous {
            self.scheduler.cancel(previous);
        }
    }

    fn leave(self: &Rc<Self>, element: &ElementRef, animate: bool) {
        let id = element.id();
        let entrance = self.entrances.borrow_mut().remove(&id);
        if let Some(timeline) = entrance {
            self.scheduler.cancel(timeline);
        }
        let exit = match self.exit.as_ref() {
            Some(exit) if animate => exit,
            _ => {
                self.children.remove_element(id);
                return;
            }
        };

        let weak = Rc::downgrade(self);
        let timeline = exit.play(
            Rc::clone(element),
            &self.scheduler,
            Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.exits.borrow_mut().remove(&id);
                    inner.children.remove_element(id);
                    trace!(%id, "switcher exit finished");
                }
            })),
        );
        self.exits.borrow_mut().insert(id, timeline);
    }

    fn teardown(&self) {
        if self.disposed.replace(true) {
            return;
        }
        if let Some(id) = self.subscription.take() {
            self.slot.unsubscribe(id);
        }

        let entrances: Vec<(ElementId, TimelineId)> = self.entrances.borrow_mut().drain().collect();
        for (id, timeline) in entrances {
            self.scheduler.cancel(timeline);
            if let (Some(entrance), Some(child)) = (self.entrance.as_ref(), self.slot.get()) {
                if child.id() == id {
                    entrance.effect().finish(&*child);
                }
            }
        }

        let exits: Vec<(ElementId, TimelineId)> = self.exits.borrow_mut().drain().collect();
        for (id, timeline) in exits {
            self.scheduler.cancel(timeline);
            self.children.remove_element(id);
        }
        debug!("switcher detached");
    }
}

impl Drop for SwitcherInner {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl Pausable for Switcher {
    /// While paused, swaps take effect immediately.
    fn paused_flag(&self) -> PausedFlag {
        self.inner.paused.clone()
    }
}

impl fmt::Debug for Switcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Switcher")
            .field("child", &self.inner.slot.id())
            .field("children", &self.inner.children)
            .field("entrance", &self.inner.entrance)
            .field("exit", &self.inner.exit)
            .field("paused", &self.inner.paused.get())
            .finish()
    }
}

static_assertions::assert_not_impl_any!(Switcher: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Size;
    use crate::container::{Element, SceneNode};

    fn node(name: &str) -> Rc<SceneNode> {
        Rc::new(SceneNode::new(name, Size::new(100.0, 40.0)))
    }

    #[test]
    fn test_of_installs_without_animation() {
        let scheduler = Scheduler::new();
        let switcher = Switcher::fade(&scheduler, 100.0).unwrap();
        let first = node("first");

        switcher.of(first.clone()).unwrap();
        assert_eq!(first.opacity().get(), 1.0);
        assert_eq!(switcher.children().ids(), vec![first.id()]);
        assert!(!switcher.is_transitioning());
        assert!(scheduler.is_idle());

        assert_eq!(
            switcher.of(node("second")),
            Err(AnimationError::ChildAlreadySet)
        );
    }

    #[test]
    fn test_swap_crossfades_and_removes_old() {
        let scheduler = Scheduler::new();
        let switcher = Switcher::fade(&scheduler, 100.0).unwrap();
        let (first, second) = (node("first"), node("second"));
        switcher.of(first.clone()).unwrap();

        switcher.set_child(Some(second.clone() as ElementRef));
        assert_eq!(switcher.children().ids(), vec![first.id(), second.id()]);
        assert_eq!(second.opacity().get(), 0.0);
        assert!(switcher.is_transitioning());

        scheduler.advance(50.0);
        assert!((first.opacity().get() - 0.5).abs() < 1e-9);
        assert!((second.opacity().get() - 0.5).abs() < 1e-9);

        scheduler.advance(50.0);
        assert_eq!(switcher.children().ids(), vec![second.id()]);
        assert_eq!(second.opacity().get(), 1.0);
        assert!(!switcher.is_transitioning());
    }

    #[test]
    fn test_clearing_child_plays_exit_only() {
        let scheduler = Scheduler::new();
        let switcher = Switcher::fade(&scheduler, 100.0).unwrap();
        let first = node("first");
        switcher.of(first.clone()).unwrap();

        switcher.set_child(None);
        assert_eq!(switcher.children().len(), 1);
        scheduler.run_until_idle(16.0, 100);
        assert!(switcher.children().is_empty());
        assert!(switcher.child().is_none());
    }

    #[test]
    fn test_paused_swap_is_immediate() {
        let scheduler = Scheduler::new();
        let switcher = Switcher::fade(&scheduler, 100.0).unwrap();
        let (first, second) = (node("first"), node("second"));
        switcher.of(first.clone()).unwrap();
        switcher.pause();

        switcher.set_child(Some(second.clone() as ElementRef));
        assert_eq!(switcher.children().ids(), vec![second.id()]);
        assert_eq!(second.opacity().get(), 1.0);
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_dispose_settles_children() {
        let scheduler = Scheduler::new();
        let switcher = Switcher::fade(&scheduler, 100.0).unwrap();
        let (first, second) = (node("first"), node("second"));
        switcher.of(first.clone()).unwrap();
        switcher.set_child(Some(second.clone() as ElementRef));
        scheduler.advance(30.0);

        switcher.dispose();
        assert_eq!(switcher.children().ids(), vec![second.id()]);
        assert_eq!(second.opacity().get(), 1.0);
        assert!(scheduler.is_idle());
    }
}
