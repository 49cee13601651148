//! Animated properties that follow a container's changing child.
//!
//! An [`OnDemandProperty`] does not wrap a cell up front. It holds a
//! retriever that picks the cell out of an element, and builds a fresh
//! [`AnimationProperty`] around that cell whenever the element it follows
//! changes. The previous property is disposed; settings, the paused flag and
//! event handlers carry over to the new one.
//!
//! ```
//! use std::rc::Rc;
//! use drift_scene::{
//!     AnimationSettings, Element, ElementRef, OnDemandProperty, Scheduler, SceneNode, Size,
//!     Switcher,
//! };
//!
//! let scheduler = Scheduler::new();
//! let switcher = Switcher::new(&scheduler, None, None)?;
//! let opacity = OnDemandProperty::new(
//!     |element: &ElementRef| element.opacity(),
//!     &scheduler,
//!     AnimationSettings::default().with_duration(100.0),
//! )?;
//! opacity.attach_to(switcher.child_slot())?;
//!
//! let node: ElementRef = Rc::new(SceneNode::new("card", Size::new(100.0, 40.0)));
//! switcher.set_child(Some(node.clone()));
//! node.opacity().set(0.0);
//! assert_eq!(node.opacity().get(), 1.0);
//!
//! scheduler.advance(100.0);
//! assert_eq!(node.opacity().get(), 0.0);
//! # Ok::<(), drift_scene::AnimationError>(())
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::animation::events::{EventHandlers, dispatch};
use crate::animation::{
    Animatable, AnimationEvent, AnimationEventKind, AnimationProperty, AnimationSettings,
    Customizable, GroupMember, LifecycleHandler, ListenableAnimation, Liveness, Pausable,
    PausedFlag, Scheduler, SubscriptionId, ValueCell,
};
use crate::error::{AnimationError, Result};

use super::element::{ElementId, ElementRef};
use super::slot::ChildSlot;

type Retriever<T> = Box<dyn Fn(&ElementRef) -> ValueCell<T>>;

struct Bound<T: Animatable> {
    element: ElementId,
    property: AnimationProperty<T>,
}

struct OnDemandInner<T: Animatable> {
    retriever: Retriever<T>,
    scheduler: Scheduler,
    settings: Cell<AnimationSettings>,
    paused: RefCell<PausedFlag>,
    /// Liveness of the node this property was attached to as a group member.
    host: Rc<RefCell<Option<Rc<dyn Liveness>>>>,
    bound: RefCell<Option<Bound<T>>>,
    handlers: Rc<RefCell<EventHandlers<T>>>,
    slot: RefCell<Option<(ChildSlot, SubscriptionId)>>,
    disposed: Cell<bool>,
}

/// An animated property resolved from whichever element it currently follows.
///
/// Clones are handles to the same property. Dropping the last handle, or
/// calling [`dispose`](Self::dispose), stops following and disposes the
/// current property.
pub struct OnDemandProperty<T: Animatable> {
    inner: Rc<OnDemandInner<T>>,
}

impl<T: Animatable> Clone for OnDemandProperty<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Animatable> OnDemandProperty<T> {
    pub fn new(
        retriever: impl Fn(&ElementRef) -> ValueCell<T> + 'static,
        scheduler: &Scheduler,
        settings: AnimationSettings,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            inner: Rc::new(OnDemandInner {
                retriever: Box::new(retriever),
                scheduler: scheduler.clone(),
                settings: Cell::new(settings),
                paused: RefCell::new(PausedFlag::default()),
                host: Rc::new(RefCell::new(None)),
                bound: RefCell::new(None),
                handlers: Rc::new(RefCell::new(EventHandlers::default())),
                slot: RefCell::new(None),
                disposed: Cell::new(false),
            }),
        })
    }

    /// Follow the child of `slot`, binding to the current one right away.
    ///
    /// Replaces any slot followed before. A child whose cell cannot be
    /// animated leaves the property unbound until the next change.
    pub fn attach_to(&self, slot: &ChildSlot) -> Result<()> {
        if self.inner.disposed.get() {
            return Err(AnimationError::Disposed);
        }
        let previous = self.inner.slot.borrow_mut().take();
        if let Some((previous, id)) = previous {
            previous.unsubscribe(id);
        }

        let weak: Weak<OnDemandInner<T>> = Rc::downgrade(&self.inner);
        let id = slot.subscribe(Rc::new(
            move |_: Option<&ElementRef>, new: Option<&ElementRef>| {
                if let Some(inner) = weak.upgrade() {
                    if let Err(err) = inner.rebind(new) {
                        warn!(%err, "on-demand property could not follow new child");
                    }
                }
            },
        ));
        *self.inner.slot.borrow_mut() = Some((slot.clone(), id));
        self.inner.rebind(slot.get().as_ref())
    }

    /// Follow a fixed element instead of a slot's child.
    pub fn bind_to(&self, element: &ElementRef) -> Result<()> {
        if self.inner.disposed.get() {
            return Err(AnimationError::Disposed);
        }
        let previous = self.inner.slot.borrow_mut().take();
        if let Some((previous, id)) = previous {
            previous.unsubscribe(id);
        }
        self.inner.rebind(Some(element))
    }

    /// The property for the current element, if bound.
    pub fn property(&self) -> Option<AnimationProperty<T>> {
        self.inner
            .bound
            .borrow()
            .as_ref()
            .map(|bound| bound.property.clone())
    }

    /// Element the property currently follows.
    pub fn target_element(&self) -> Option<ElementId> {
        self.inner.bound.borrow().as_ref().map(|bound| bound.element)
    }

    pub fn is_animating(&self) -> bool {
        self.inner
            .bound
            .borrow()
            .as_ref()
            .is_some_and(|bound| bound.property.is_animating())
    }

    /// Observe `flag` instead of this property's own paused flag.
    pub fn bind_paused(&self, flag: PausedFlag) {
        if let Some(bound) = self.inner.bound.borrow().as_ref() {
            bound.property.bind_paused(flag.clone());
        }
        *self.inner.paused.borrow_mut() = flag;
    }

    pub fn dispose(&self) {
        self.inner.teardown();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl<T: Animatable> OnDemandInner<T> {
    fn rebind(&self, element: Option<&ElementRef>) -> Result<()> {
        if self.disposed.get() {
            return Ok(());
        }
        let previous = self.bound.borrow_mut().take();
        if let Some(previous) = previous {
            previous.property.dispose();
        }
        let Some(element) = element else {
            debug!("on-demand property unbound");
            return Ok(());
        };

        let property =
            AnimationProperty::new((self.retriever)(element), &self.scheduler, self.settings.get())?;
        property.bind_paused(self.paused.borrow().clone());
        let started = Rc::clone(&self.handlers);
        property.on_animation_started(move |event: &AnimationEvent<T>| dispatch(&started, event));
        let ended = Rc::clone(&self.handlers);
        property.on_animation_ended(move |event: &AnimationEvent<T>| dispatch(&ended, event));

        let child = Rc::clone(element);
        let host = Rc::clone(&self.host);
        let liveness: Rc<dyn Liveness> = Rc::new(move || {
            child.is_live() && host.borrow().as_ref().is_none_or(|host| host.is_live())
        });
        property.attach_to(liveness)?;

        debug!(element = %element.id(), "on-demand property bound");
        *self.bound.borrow_mut() = Some(Bound {
            element: element.id(),
            property,
        });
        Ok(())
    }

    fn teardown(&self) {
        if self.disposed.replace(true) {
            return;
        }
        let slot = self.slot.borrow_mut().take();
        if let Some((slot, id)) = slot {
            slot.unsubscribe(id);
        }
        let bound = self.bound.borrow_mut().take();
        if let Some(bound) = bound {
            bound.property.dispose();
        }
        self.handlers.borrow_mut().clear();
    }
}

impl<T: Animatable> Drop for OnDemandInner<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<T: Animatable> Pausable for OnDemandProperty<T> {
    fn paused_flag(&self) -> PausedFlag {
        self.inner.paused.borrow().clone()
    }
}

impl<T: Animatable> Customizable for OnDemandProperty<T> {
    fn settings(&self) -> AnimationSettings {
        self.inner.settings.get()
    }

    /// Applies to the current property and every one built later.
    fn set_settings(&self, settings: AnimationSettings) -> Result<()> {
        settings.validate()?;
        self.inner.settings.set(settings);
        if let Some(bound) = self.inner.bound.borrow().as_ref() {
            bound.property.set_settings(settings)?;
        }
        Ok(())
    }
}

impl<T: Animatable> ListenableAnimation for OnDemandProperty<T> {
    type Value = T;

    fn on_animation_started(&self, handler: impl Fn(&AnimationEvent<T>) + 'static) {
        self.inner
            .handlers
            .borrow_mut()
            .push(AnimationEventKind::Started, Rc::new(handler));
    }

    fn on_animation_ended(&self, handler: impl Fn(&AnimationEvent<T>) + 'static) {
        self.inner
            .handlers
            .borrow_mut()
            .push(AnimationEventKind::Ended, Rc::new(handler));
    }
}

/// As a group member the property animates only while both the group's node
/// and the followed element are live.
impl<T: Animatable> GroupMember for OnDemandProperty<T> {
    fn bind_paused(&self, flag: PausedFlag) {
        OnDemandProperty::bind_paused(self, flag);
    }

    fn apply_settings(&self, settings: AnimationSettings) -> Result<()> {
        self.set_settings(settings)
    }

    fn current_settings(&self) -> AnimationSettings {
        self.settings()
    }

    fn attach(&self, liveness: Rc<dyn Liveness>) -> Result<()> {
        if self.inner.disposed.get() {
            return Err(AnimationError::Disposed);
        }
        *self.inner.host.borrow_mut() = Some(liveness);
        Ok(())
    }

    fn forward_lifecycle(&self, sink: LifecycleHandler) {
        let started = Rc::clone(&sink);
        self.on_animation_started(move |event: &AnimationEvent<T>| started(&event.lifecycle()));
        self.on_animation_ended(move |event: &AnimationEvent<T>| sink(&event.lifecycle()));
    }

    fn is_animating(&self) -> bool {
        OnDemandProperty::is_animating(self)
    }

    fn dispose(&self) {
        OnDemandProperty::dispose(self);
    }
}

impl<T: Animatable> fmt::Debug for OnDemandProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnDemandProperty")
            .field("target", &self.target_element())
            .field("settings", &self.inner.settings.get())
            .field("paused", &self.inner.paused.borrow().get())
            .field("following_slot", &self.inner.slot.borrow().is_some())
            .finish()
    }
}

static_assertions::assert_not_impl_any!(OnDemandProperty<f64>: Send, Sync);
