//! Implicitly animated properties.
//!
//! An [`AnimationProperty`] watches one observable cell. When someone writes a
//! new value, the property puts the old value back and animates from there to
//! the new one, one frame per scheduler pulse. The cell always holds what is
//! on screen; [`AnimationProperty::target`] tells where it is heading.
//!
//! # Interception
//!
//! The property's own writes (putting the old value back, and every frame)
//! also notify the cell's listeners, including the property itself. Before
//! each such write the property records the value it is about to write; the
//! matching notification consumes the record and is ignored. Any other
//! notification is an external change and is handled in this order:
//!
//! 1. paused, detached, or not interpolable: the value stands and any run in
//!    flight stops;
//! 2. zero duration: the value stands;
//! 3. otherwise the old value is written back, the current run (if any) is
//!    interrupted, and a new run starts from the value on screen.
//!
//! # Usage
//!
//! ```
//! use drift_scene::animation::{AnimationProperty, AnimationSettings, Scheduler, ValueCell};
//!
//! let scheduler = Scheduler::new();
//! let opacity = ValueCell::new(0.0_f64);
//! let property = AnimationProperty::new(opacity.clone(), &scheduler, AnimationSettings::default())?;
//! property.register()?;
//!
//! opacity.set(1.0);
//! assert_eq!(opacity.get(), 0.0);
//!
//! scheduler.advance(500.0);
//! assert!((opacity.get() - 0.5).abs() < 1e-9);
//!
//! scheduler.advance(500.0);
//! assert_eq!(opacity.get(), 1.0);
//! # Ok::<(), drift_scene::AnimationError>(())
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use super::capability::{
    Customizable, GroupMember, LifecycleHandler, ListenableAnimation, Liveness, Pausable,
    PausedFlag,
};
use super::cell::{ObservableCell, SubscriptionId};
use super::curve::Curve;
use super::events::{AnimationEvent, AnimationEventKind, EventHandlers, dispatch};
use super::interpolate::Animatable;
use super::scheduler::{Scheduler, TimelineStatus};
use super::settings::AnimationSettings;
use super::types::TimelineId;
use crate::error::{AnimationError, Result};

/// A write the property is about to make, which therefore owns the next
/// matching notification.
#[derive(Debug)]
enum OwnedWrite<T> {
    /// Putting the pre-change value back.
    Revert(T),
    /// An animation frame.
    Frame(T),
}

impl<T: PartialEq> OwnedWrite<T> {
    fn value(&self) -> &T {
        match self {
            Self::Revert(value) | Self::Frame(value) => value,
        }
    }

    fn claims(&self, new: &T) -> bool {
        self.value() == new
    }
}

#[derive(Debug)]
struct Run<T> {
    timeline_id: TimelineId,
    start_ms: f64,
    duration_ms: f64,
    curve: Curve,
    from: T,
    to: T,
    last_emitted: Option<(f64, T)>,
}

impl<T: Animatable> Run<T> {
    fn progress(&self, now_ms: f64) -> f64 {
        if self.duration_ms <= 0.0 {
            return 1.0;
        }
        ((now_ms - self.start_ms) / self.duration_ms).clamp(0.0, 1.0)
    }

    /// The value on screen: the last frame, or the start if none was written yet.
    fn reached(&self) -> T {
        match &self.last_emitted {
            Some((_, value)) => value.clone(),
            None => self.from.clone(),
        }
    }
}

struct RunState<T> {
    run: Option<Run<T>>,
    owned: Option<OwnedWrite<T>>,
}

struct PropertyInner<T: Animatable> {
    cell: Box<dyn ObservableCell<T>>,
    scheduler: Scheduler,
    settings: Cell<AnimationSettings>,
    paused: RefCell<PausedFlag>,
    liveness: RefCell<Option<Rc<dyn Liveness>>>,
    subscription: Cell<Option<SubscriptionId>>,
    bindings: RefCell<Vec<SubscriptionId>>,
    state: RefCell<RunState<T>>,
    handlers: RefCell<EventHandlers<T>>,
    disposed: Cell<bool>,
}

/// An observable cell whose external writes are animated.
///
/// Clones are handles to the same property. Dropping the last handle, or
/// calling [`dispose`](Self::dispose), removes the listener and cancels any
/// run without writing to the cell again.
pub struct AnimationProperty<T: Animatable> {
    inner: Rc<PropertyInner<T>>,
}

impl<T: Animatable> Clone for AnimationProperty<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Animatable> AnimationProperty<T> {
    /// Wrap `cell`. Nothing is intercepted until [`register`](Self::register)
    /// or [`attach_to`](Self::attach_to) is called.
    ///
    /// Fails if `settings` is invalid or the cell holds a value that has no
    /// interpolation.
    pub fn new(
        cell: impl ObservableCell<T> + 'static,
        scheduler: &Scheduler,
        settings: AnimationSettings,
    ) -> Result<Self> {
        settings.validate()?;
        let current = cell.get();
        if !current.is_interpolable() {
            return Err(AnimationError::UnsupportedValueType(current.type_label()));
        }

        Ok(Self {
            inner: Rc::new(PropertyInner {
                cell: Box::new(cell),
                scheduler: scheduler.clone(),
                settings: Cell::new(settings),
                paused: RefCell::new(PausedFlag::default()),
                liveness: RefCell::new(None),
                subscription: Cell::new(None),
                bindings: RefCell::new(Vec::new()),
                state: RefCell::new(RunState {
                    run: None,
                    owned: None,
                }),
                handlers: RefCell::new(EventHandlers::default()),
                disposed: Cell::new(false),
            }),
        })
    }

    /// Start intercepting writes to the cell.
    pub fn register(&self) -> Result<()> {
        if self.inner.disposed.get() {
            return Err(AnimationError::Disposed);
        }
        if self.inner.subscription.get().is_some() {
            return Err(AnimationError::AlreadyRegistered);
        }

        let weak: Weak<PropertyInner<T>> = Rc::downgrade(&self.inner);
        let id = self.inner.cell.subscribe(Rc::new(move |old: &T, new: &T| {
            if let Some(inner) = weak.upgrade() {
                inner.on_changed(old, new);
            }
        }));
        self.inner.subscription.set(Some(id));
        trace!(value = ?self.inner.cell.get(), "animation property registered");
        Ok(())
    }

    /// Attach to a node: writes are animated only while it is live.
    ///
    /// Registers the listener unless that already happened; re-attaching
    /// just swaps the liveness handle.
    pub fn attach_to(&self, liveness: Rc<dyn Liveness>) -> Result<()> {
        if self.inner.disposed.get() {
            return Err(AnimationError::Disposed);
        }
        *self.inner.liveness.borrow_mut() = Some(liveness);
        if self.is_registered() {
            Ok(())
        } else {
            self.register()
        }
    }

    pub fn is_registered(&self) -> bool {
        self.inner.subscription.get().is_some()
    }

    /// Observe `flag` instead of this property's own paused flag.
    pub fn bind_paused(&self, flag: PausedFlag) {
        *self.inner.paused.borrow_mut() = flag;
    }

    pub fn is_animating(&self) -> bool {
        self.inner.state.borrow().run.is_some()
    }

    /// Value the current run is heading for.
    pub fn target(&self) -> Option<T> {
        self.inner.state.borrow().run.as_ref().map(|run| run.to.clone())
    }

    /// Value currently in the cell.
    pub fn value(&self) -> T {
        self.inner.cell.get()
    }

    /// Write through to the cell, as any external writer would.
    pub fn set(&self, value: T) {
        self.inner.cell.set(value);
    }

    /// The wrapped cell.
    pub fn cell(&self) -> &dyn ObservableCell<T> {
        &*self.inner.cell
    }

    /// Keep `target` equal to `mapper(value)` through every frame.
    pub fn add_binding<V>(
        &self,
        target: impl ObservableCell<V> + 'static,
        mapper: impl Fn(&T) -> V + 'static,
    ) -> SubscriptionId {
        target.set(mapper(&self.inner.cell.get()));
        let weak: Weak<PropertyInner<T>> = Rc::downgrade(&self.inner);
        let id = self.inner.cell.subscribe(Rc::new(move |_: &T, _: &T| {
            if let Some(inner) = weak.upgrade() {
                if !inner.disposed.get() {
                    target.set(mapper(&inner.cell.get()));
                }
            }
        }));
        self.inner.bindings.borrow_mut().push(id);
        id
    }

    /// Remove the listener and bindings and cancel any run. The cell keeps
    /// whatever value it holds now.
    pub fn dispose(&self) {
        self.inner.teardown();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }
}

impl<T: Animatable> PropertyInner<T> {
    fn on_changed(self: &Rc<Self>, old: &T, new: &T) {
        if self.disposed.get() {
            return;
        }

        let owned = self.state.borrow_mut().owned.take();
        if let Some(write) = owned {
            if write.claims(new) {
                trace!(?write, "own write ignored");
                return;
            }
        }

        if self.paused.borrow().get() || !self.is_live() || !old.can_interpolate_to(new) {
            trace!(?new, "change applied without animation");
            if let Some(ended) = self.stop_run() {
                dispatch(&self.handlers, &ended);
            }
            return;
        }

        let settings = self.settings.get();
        if settings.is_instant() {
            if let Some(ended) = self.stop_run() {
                dispatch(&self.handlers, &ended);
            }
            return;
        }

        self.write_owned(OwnedWrite::Revert(old.clone()));
        let interrupted = self.stop_run();
        let started = self.start_run(new.clone(), settings, interrupted.is_some());

        if let Some(ended) = interrupted {
            dispatch(&self.handlers, &ended);
        }
        dispatch(&self.handlers, &started);
    }

    fn is_live(&self) -> bool {
        let liveness = self.liveness.borrow().clone();
        liveness.is_none_or(|node| node.is_live())
    }

    /// Write a value the property itself owns. The record is dropped after
    /// the write in case the cell did not notify (value unchanged).
    fn write_owned(&self, write: OwnedWrite<T>) {
        let value = write.value().clone();
        self.state.borrow_mut().owned = Some(write);
        self.cell.set(value);
        self.state.borrow_mut().owned = None;
    }

    /// Stop the run in flight, if any, and build its interrupted `Ended` event.
    fn stop_run(&self) -> Option<AnimationEvent<T>> {
        let run = self.state.borrow_mut().run.take()?;
        self.scheduler.cancel(run.timeline_id);
        let reached = run.reached();
        debug!(id = %run.timeline_id, ?reached, to = ?run.to, "animation interrupted");
        Some(AnimationEvent::ended(run.timeline_id, true, reached))
    }

    fn start_run(
        self: &Rc<Self>,
        to: T,
        settings: AnimationSettings,
        replaces: bool,
    ) -> AnimationEvent<T> {
        let from = self.cell.get();
        let weak = Rc::downgrade(self);
        let timeline_id = self.scheduler.schedule(move |now| match weak.upgrade() {
            Some(inner) => inner.tick(now),
            None => TimelineStatus::Finished,
        });

        debug!(
            id = %timeline_id,
            ?from,
            ?to,
            duration_ms = settings.duration_ms,
            curve = %settings.curve,
            "animation started"
        );

        let mut state = self.state.borrow_mut();
        debug_assert!(state.run.is_none(), "a property runs at most one animation");
        state.run = Some(Run {
            timeline_id,
            start_ms: self.scheduler.now_ms(),
            duration_ms: settings.duration_ms,
            curve: settings.curve,
            from: from.clone(),
            to,
            last_emitted: None,
        });
        AnimationEvent::started(timeline_id, replaces, from)
    }

    fn tick(&self, now_ms: f64) -> TimelineStatus {
        let (timeline_id, value, finished) = {
            let mut state = self.state.borrow_mut();
            let Some(run) = state.run.as_mut() else {
                return TimelineStatus::Finished;
            };
            let progress = run.progress(now_ms);
            let finished = progress >= 1.0;
            let value = if finished {
                run.to.clone()
            } else {
                run.from.interpolate(&run.to, run.curve.evaluate(progress))
            };
            run.last_emitted = Some((now_ms, value.clone()));
            (run.timeline_id, value, finished)
        };

        trace!(id = %timeline_id, ?value, "frame");
        self.write_owned(OwnedWrite::Frame(value.clone()));

        let mut state = self.state.borrow_mut();
        // A listener reacting to the frame may have started a newer run.
        if state.run.as_ref().map(|run| run.timeline_id) != Some(timeline_id) {
            return TimelineStatus::Finished;
        }
        if !finished {
            return TimelineStatus::Running;
        }
        state.run = None;
        drop(state);

        debug!(id = %timeline_id, ?value, "animation finished");
        dispatch(&self.handlers, &AnimationEvent::ended(timeline_id, false, value));
        TimelineStatus::Finished
    }

    fn teardown(&self) {
        if self.disposed.replace(true) {
            return;
        }
        if let Some(id) = self.subscription.take() {
            self.cell.unsubscribe(id);
        }
        for id in self.bindings.borrow_mut().drain(..) {
            self.cell.unsubscribe(id);
        }
        let run = self.state.borrow_mut().run.take();
        if let Some(run) = run {
            self.scheduler.cancel(run.timeline_id);
            debug!(id = %run.timeline_id, "animation cancelled by teardown");
        }
        self.handlers.borrow_mut().clear();
    }
}

impl<T: Animatable> Drop for PropertyInner<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<T: Animatable> Pausable for AnimationProperty<T> {
    fn paused_flag(&self) -> PausedFlag {
        self.inner.paused.borrow().clone()
    }
}

impl<T: Animatable> Customizable for AnimationProperty<T> {
    fn settings(&self) -> AnimationSettings {
        self.inner.settings.get()
    }

    fn set_settings(&self, settings: AnimationSettings) -> Result<()> {
        settings.validate()?;
        self.inner.settings.set(settings);
        Ok(())
    }
}

impl<T: Animatable> ListenableAnimation for AnimationProperty<T> {
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

impl<T: Animatable> GroupMember for AnimationProperty<T> {
    fn bind_paused(&self, flag: PausedFlag) {
        AnimationProperty::bind_paused(self, flag);
    }

    fn apply_settings(&self, settings: AnimationSettings) -> Result<()> {
        self.set_settings(settings)
    }

    fn current_settings(&self) -> AnimationSettings {
        self.settings()
    }

    fn attach(&self, liveness: Rc<dyn Liveness>) -> Result<()> {
        self.attach_to(liveness)
    }

    fn forward_lifecycle(&self, sink: LifecycleHandler) {
        let started = Rc::clone(&sink);
        self.on_animation_started(move |event: &AnimationEvent<T>| started(&event.lifecycle()));
        self.on_animation_ended(move |event: &AnimationEvent<T>| sink(&event.lifecycle()));
    }

    fn is_animating(&self) -> bool {
        AnimationProperty::is_animating(self)
    }

    fn dispose(&self) {
        AnimationProperty::dispose(self);
    }
}

impl<T: Animatable> fmt::Debug for AnimationProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("AnimationProperty")
            .field("value", &self.inner.cell.get())
            .field("settings", &self.inner.settings.get())
            .field("paused", &self.inner.paused.borrow().get())
            .field("registered", &self.inner.subscription.get().is_some())
            .field("run", &state.run)
            .finish()
    }
}

static_assertions::assert_not_impl_any!(AnimationProperty<f64>: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::cell::ValueCell;
    use crate::animation::events::EventQueue;
    use crate::animation::types::{AnimatableValue, Visibility};

    const EPSILON: f64 = 1e-6;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn setup(duration_ms: f64) -> (Scheduler, ValueCell<f64>, AnimationProperty<f64>) {
        let scheduler = Scheduler::new();
        let cell = ValueCell::new(0.0);
        let property = AnimationProperty::new(
            cell.clone(),
            &scheduler,
            AnimationSettings::new(duration_ms, Curve::Linear),
        )
        .unwrap();
        property.register().unwrap();
        (scheduler, cell, property)
    }

    fn record(property: &AnimationProperty<f64>) -> EventQueue<f64> {
        let queue = EventQueue::new();
        property.on_animation_started(queue.handler());
        property.on_animation_ended(queue.handler());
        queue
    }

    #[test]
    fn test_write_is_reverted_then_animated() {
        let (scheduler, cell, property) = setup(1000.0);

        cell.set(100.0);
        assert_eq!(cell.get(), 0.0);
        assert!(property.is_animating());
        assert_eq!(property.target(), Some(100.0));

        scheduler.advance(250.0);
        assert!(approx_eq(cell.get(), 25.0));

        scheduler.advance(750.0);
        assert_eq!(cell.get(), 100.0);
        assert!(!property.is_animating());
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_single_started_and_ended_per_change() {
        let (scheduler, cell, property) = setup(100.0);
        let events = record(&property);

        cell.set(10.0);
        scheduler.run_until_idle(16.0, 100);

        let events = events.drain();
        assert_eq!(events.len(), 2);
        assert!(events[0].is_started() && !events[0].interrupted);
        assert_eq!(events[0].value, 0.0);
        assert!(events[1].is_ended() && !events[1].interrupted);
        assert_eq!(events[1].value, 10.0);
        assert_eq!(events[0].timeline_id, events[1].timeline_id);
    }

    #[test]
    fn test_preemption_continues_from_current_value() {
        let (scheduler, cell, property) = setup(1000.0);
        let events = record(&property);

        cell.set(100.0);
        scheduler.advance(500.0);
        assert!(approx_eq(cell.get(), 50.0));

        cell.set(200.0);
        assert!(approx_eq(cell.get(), 50.0));
        assert_eq!(property.target(), Some(200.0));

        scheduler.advance(500.0);
        assert!(approx_eq(cell.get(), 125.0));

        let kinds: Vec<_> = events.drain().iter().map(|e| (e.kind, e.interrupted)).collect();
        assert_eq!(
            kinds,
            vec![
                (AnimationEventKind::Started, false),
                (AnimationEventKind::Ended, true),
                (AnimationEventKind::Started, true),
            ]
        );
    }

    #[test]
    fn test_paused_writes_apply_immediately() {
        let (scheduler, cell, property) = setup(1000.0);
        property.pause();

        cell.set(42.0);
        assert_eq!(cell.get(), 42.0);
        assert!(!property.is_animating());

        scheduler.advance(16.0);
        assert_eq!(cell.get(), 42.0);
    }

    #[test]
    fn test_pause_mid_run_lets_external_value_stand() {
        let (scheduler, cell, property) = setup(1000.0);
        let events = record(&property);

        cell.set(100.0);
        scheduler.advance(300.0);
        property.pause();
        // Pausing alone keeps the run going.
        assert!(property.is_animating());

        cell.set(7.0);
        assert_eq!(cell.get(), 7.0);
        assert!(!property.is_animating());

        scheduler.advance(300.0);
        assert_eq!(cell.get(), 7.0);

        let last = events.drain().pop().unwrap();
        assert!(last.is_ended() && last.interrupted);
        assert!(approx_eq(last.value, 30.0));
    }

    #[test]
    fn test_zero_duration_passes_through() {
        let (scheduler, cell, property) = setup(0.0);
        let events = record(&property);

        cell.set(5.0);
        assert_eq!(cell.get(), 5.0);
        assert!(!property.is_animating());
        assert!(scheduler.is_idle());
        assert!(events.is_empty());
    }

    #[test]
    fn test_detached_node_is_not_animated() {
        let (_scheduler, cell, property) = setup(1000.0);
        let live = Rc::new(Cell::new(false));
        let flag = Rc::clone(&live);
        property.attach_to(Rc::new(move || flag.get())).unwrap();

        cell.set(3.0);
        assert_eq!(cell.get(), 3.0);

        live.set(true);
        cell.set(6.0);
        assert_eq!(cell.get(), 3.0);
        assert!(property.is_animating());
    }

    #[test]
    fn test_register_twice_is_rejected() {
        let (_scheduler, cell, property) = setup(1000.0);
        assert_eq!(property.register(), Err(AnimationError::AlreadyRegistered));

        cell.set(1.0);
        assert!(property.is_animating());
        assert_eq!(cell.listener_count(), 1);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let scheduler = Scheduler::new();
        let result = AnimationProperty::new(
            ValueCell::new(0.0),
            &scheduler,
            AnimationSettings::default().with_duration(-5.0),
        );
        assert!(matches!(result, Err(AnimationError::InvalidDuration(_))));

        let (_scheduler, _cell, property) = setup(100.0);
        assert!(property.set_settings(AnimationSettings::default().with_duration(f64::NAN)).is_err());
        assert_eq!(property.settings().duration_ms, 100.0);
    }

    #[test]
    fn test_discrete_value_rejected() {
        let scheduler = Scheduler::new();
        let cell = ValueCell::new(AnimatableValue::from(Visibility::Visible));
        let result = AnimationProperty::new(cell, &scheduler, AnimationSettings::default());
        assert!(matches!(
            result,
            Err(AnimationError::UnsupportedValueType("visibility"))
        ));
    }

    #[test]
    fn test_variant_change_applies_immediately() {
        let scheduler = Scheduler::new();
        let cell = ValueCell::new(AnimatableValue::from(0.0_f64));
        let property =
            AnimationProperty::new(cell.clone(), &scheduler, AnimationSettings::default()).unwrap();
        property.register().unwrap();

        let red = AnimatableValue::from([1.0_f32, 0.0, 0.0, 1.0]);
        cell.set(red.clone());
        assert_eq!(cell.get(), red);
        assert!(!property.is_animating());
    }

    #[test]
    fn test_settings_affect_future_runs_only() {
        let (scheduler, cell, property) = setup(1000.0);
        cell.set(100.0);
        property
            .custom(|s| s.with_duration(100.0).with_curve(Curve::EaseIn))
            .unwrap();

        scheduler.advance(500.0);
        assert!(approx_eq(cell.get(), 50.0));
        assert_eq!(property.settings().curve, Curve::EaseIn);
    }

    #[test]
    fn test_dispose_stops_without_write_back() {
        let (scheduler, cell, property) = setup(1000.0);
        cell.set(100.0);
        scheduler.advance(400.0);
        let reached = cell.get();

        property.dispose();
        scheduler.advance(400.0);
        assert_eq!(cell.get(), reached);
        assert_eq!(cell.listener_count(), 0);
        assert!(scheduler.is_idle());

        cell.set(9.0);
        assert_eq!(cell.get(), 9.0);
        assert_eq!(property.register(), Err(AnimationError::Disposed));
    }

    #[test]
    fn test_drop_tears_down() {
        let (scheduler, cell, property) = setup(1000.0);
        cell.set(100.0);
        scheduler.advance(100.0);

        drop(property);
        assert_eq!(cell.listener_count(), 0);
        assert_eq!(scheduler.active_timelines(), 0);
    }

    #[test]
    fn test_binding_follows_frames() {
        let (scheduler, cell, property) = setup(1000.0);
        let label = ValueCell::new(String::new());
        property.add_binding(label.clone(), |v| format!("{v:.0}%"));
        assert_eq!(label.get(), "0%");

        cell.set(100.0);
        assert_eq!(label.get(), "0%");

        scheduler.advance(500.0);
        assert_eq!(label.get(), "50%");

        scheduler.advance(500.0);
        assert_eq!(label.get(), "100%");
    }

    #[test]
    fn test_bound_pause_flag() {
        let (_scheduler, cell, property) = setup(1000.0);
        let shared = PausedFlag::default();
        property.bind_paused(shared.clone());

        shared.set(true);
        assert!(property.is_paused());
        cell.set(11.0);
        assert_eq!(cell.get(), 11.0);
    }
}
