//! Animation lifecycle events.
//!
//! Every run reports one `Started` and one `Ended` event. An `Ended` event with
//! `interrupted == true` means a newer change, a pause or teardown stopped
//! the run early; a `Started` event with `interrupted == true` means the run
//! replaced one that was still in flight.
//!
//! Handlers are plain closures. [`EventQueue`] collects events for polling
//! instead, which is what the demo and the tests do.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use super::types::TimelineId;

/// Which edge of a run an event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationEventKind {
    Started,
    Ended,
}

/// Event emitted when a run starts or ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationEvent<T> {
    pub kind: AnimationEventKind,
    /// Timeline driving the run.
    pub timeline_id: TimelineId,
    pub interrupted: bool,
    /// The run's start value for `Started`, the value reached for `Ended`.
    pub value: T,
}

/// Type-erased event, as seen by group-level handlers.
pub type LifecycleEvent = AnimationEvent<()>;

/// Shared event callback.
pub type EventHandler<T> = Rc<dyn Fn(&AnimationEvent<T>)>;

impl<T> AnimationEvent<T> {
    pub fn started(timeline_id: TimelineId, interrupted: bool, value: T) -> Self {
        Self {
            kind: AnimationEventKind::Started,
            timeline_id,
            interrupted,
            value,
        }
    }

    pub fn ended(timeline_id: TimelineId, interrupted: bool, value: T) -> Self {
        Self {
            kind: AnimationEventKind::Ended,
            timeline_id,
            interrupted,
            value,
        }
    }

    pub fn is_started(&self) -> bool {
        self.kind == AnimationEventKind::Started
    }

    pub fn is_ended(&self) -> bool {
        self.kind == AnimationEventKind::Ended
    }

    /// Drop the value, keeping kind, timeline and interruption flag.
    pub fn lifecycle(&self) -> LifecycleEvent {
        AnimationEvent {
            kind: self.kind,
            timeline_id: self.timeline_id,
            interrupted: self.interrupted,
            value: (),
        }
    }
}

/// Additive started/ended handler lists.
pub(crate) struct EventHandlers<T> {
    started: Vec<EventHandler<T>>,
    ended: Vec<EventHandler<T>>,
}

impl<T> Default for EventHandlers<T> {
    fn default() -> Self {
        Self {
            started: Vec::new(),
            ended: Vec::new(),
        }
    }
}

impl<T> EventHandlers<T> {
    pub(crate) fn push(&mut self, kind: AnimationEventKind, handler: EventHandler<T>) {
        match kind {
            AnimationEventKind::Started => self.started.push(handler),
            AnimationEventKind::Ended => self.ended.push(handler),
        }
    }

    /// Clone the handlers for `kind` so they can be called without a borrow held.
    pub(crate) fn snapshot(&self, kind: AnimationEventKind) -> Vec<EventHandler<T>> {
        match kind {
            AnimationEventKind::Started => self.started.clone(),
            AnimationEventKind::Ended => self.ended.clone(),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.started.clear();
        self.ended.clear();
    }
}

/// Dispatch `event` to the matching handlers in `handlers`.
pub(crate) fn dispatch<T>(handlers: &RefCell<EventHandlers<T>>, event: &AnimationEvent<T>) {
    let snapshot = handlers.borrow().snapshot(event.kind);
    for handler in snapshot {
        handler(event);
    }
}

/// Polling queue of events.
///
/// Clones share the same queue. Register [`EventQueue::handler`] for both
/// kinds to record everything a property or group reports.
pub struct EventQueue<T> {
    events: Rc<RefCell<VecDeque<AnimationEvent<T>>>>,
}

impl<T> Clone for EventQueue<T> {
    fn clone(&self) -> Self {
        Self {
            events: Rc::clone(&self.events),
        }
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self {
            events: Rc::new(RefCell::new(VecDeque::new())),
        }
    }
}

impl<T: Clone + 'static> EventQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A handler that appends every event it receives to this queue.
    pub fn handler(&self) -> impl Fn(&AnimationEvent<T>) + 'static {
        let events = Rc::clone(&self.events);
        move |event: &AnimationEvent<T>| events.borrow_mut().push_back(event.clone())
    }

    pub fn push(&self, event: AnimationEvent<T>) {
        self.events.borrow_mut().push_back(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn pop(&self) -> Option<AnimationEvent<T>> {
        self.events.borrow_mut().pop_front()
    }

    /// Remove and return all pending events.
    pub fn drain(&self) -> Vec<AnimationEvent<T>> {
        self.events.borrow_mut().drain(..).collect()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Number of pending events of `kind`.
    pub fn count(&self, kind: AnimationEventKind) -> usize {
        self.events.borrow().iter().filter(|e| e.kind == kind).count()
    }
}
