//! Groups of animated properties sharing one node.
//!
//! A group attaches all its members to the same node, shares one paused flag
//! between them, broadcasts settings, and reports every member's lifecycle
//! events to group-level handlers. Each member still runs its own timeline.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use super::capability::{
    Customizable, GroupMember, LifecycleHandler, ListenableAnimation, Liveness, Pausable,
    PausedFlag,
};
use super::events::{AnimationEvent, AnimationEventKind, EventHandlers, LifecycleEvent, dispatch};
use super::settings::AnimationSettings;
use crate::error::Result;

/// Animated properties of one node, controlled together.
///
/// Members are disposed when the group is dropped.
pub struct AnimatedGroup {
    liveness: Rc<dyn Liveness>,
    members: Vec<Box<dyn GroupMember>>,
    paused: PausedFlag,
    settings: Cell<Option<AnimationSettings>>,
    handlers: Rc<RefCell<EventHandlers<()>>>,
}

impl AnimatedGroup {
    pub fn new(liveness: Rc<dyn Liveness>) -> Self {
        Self {
            liveness,
            members: Vec::new(),
            paused: PausedFlag::default(),
            settings: Cell::new(None),
            handlers: Rc::new(RefCell::new(EventHandlers::default())),
        }
    }

    /// Add a member: it observes the group's paused flag, takes the group's
    /// settings if any were set, reports to the group's handlers and is
    /// attached to the group's node.
    pub fn add(&mut self, member: impl GroupMember + 'static) -> Result<()> {
        if let Some(settings) = self.settings.get() {
            member.apply_settings(settings)?;
        }
        member.bind_paused(self.paused.clone());
        member.forward_lifecycle(self.sink());
        member.attach(Rc::clone(&self.liveness))?;
        self.members.push(Box::new(member));
        debug!(members = self.members.len(), "animated group member added");
        Ok(())
    }

    /// Builder form of [`add`](Self::add).
    pub fn with(mut self, member: impl GroupMember + 'static) -> Result<Self> {
        self.add(member)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether any member has a run in flight.
    pub fn is_animating(&self) -> bool {
        self.members.iter().any(|member| member.is_animating())
    }

    /// Dispose every member. The group stays empty afterwards.
    pub fn dispose(&mut self) {
        for member in self.members.drain(..) {
            member.dispose();
        }
        self.handlers.borrow_mut().clear();
    }

    fn sink(&self) -> LifecycleHandler {
        let handlers = Rc::clone(&self.handlers);
        Rc::new(move |event: &LifecycleEvent| dispatch(&handlers, event))
    }
}

impl Pausable for AnimatedGroup {
    fn paused_flag(&self) -> PausedFlag {
        self.paused.clone()
    }
}

impl Customizable for AnimatedGroup {
    /// The last broadcast settings, else the first member's, else defaults.
    fn settings(&self) -> AnimationSettings {
        self.settings
            .get()
            .or_else(|| self.members.first().map(|m| m.current_settings()))
            .unwrap_or_default()
    }

    /// Validate once, then apply to every member.
    fn set_settings(&self, settings: AnimationSettings) -> Result<()> {
        settings.validate()?;
        for member in &self.members {
            member.apply_settings(settings)?;
        }
        self.settings.set(Some(settings));
        Ok(())
    }
}

impl ListenableAnimation for AnimatedGroup {
    type Value = ();

    fn on_animation_started(&self, handler: impl Fn(&AnimationEvent<()>) + 'static) {
        self.handlers
            .borrow_mut()
            .push(AnimationEventKind::Started, Rc::new(handler));
    }

    fn on_animation_ended(&self, handler: impl Fn(&AnimationEvent<()>) + 'static) {
        self.handlers
            .borrow_mut()
            .push(AnimationEventKind::Ended, Rc::new(handler));
    }
}

impl Drop for AnimatedGroup {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for AnimatedGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatedGroup")
            .field("members", &self.members.len())
            .field("paused", &self.paused.get())
            .field("settings", &self.settings.get())
            .finish()
    }
}
