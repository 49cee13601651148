//! Animated insertion and removal for ordered containers.
//!
//! [`ContainerReflow`] listens to a [`ChildList`]. Inserted elements play an
//! entrance animation while the siblings after them slide out of the way;
//! removed elements stay in the list until their exit animation finishes
//! while the siblings after them slide into the gap.
//!
//! # Relocation
//!
//! Siblings move by animating their translation along the container axis.
//! Once the change lands in layout, the layout shift cancels the offset:
//!
//! - insertion: siblings after `E` start at `-(extent(E) + spacing)` (what
//!   they looked like before `E` pushed them) and slide toward 0;
//! - removal: siblings after `E` slide toward `-(extent(E) + spacing)` and
//!   hold there until `E` actually leaves, when the layout shift brings the
//!   offset back to 0 without any visible movement.
//!
//! A sibling's target is the sum of the gaps still closing before it, so a
//! pass that takes over a sibling mid-removal keeps it aligned with the
//! exiting element. When an exiting element leaves while siblings are still
//! moving, their offsets and pass endpoints are rebased by the same shift.
//!
//! Relocation is set up one processing turn after the change so that layout
//! has caught up, and starts moving once the triggering animation's delay
//! has elapsed. Each relocation pass owns the siblings it moves; a newer pass
//! over the same sibling takes it over and continues from its current
//! offset.
//!
//! # Removal bookkeeping
//!
//! A removal is undone on the spot: the element goes straight back to its
//! index so the exit animation can play, and is removed for real once the
//! exit finishes. Both the put-back and the final removal produce list
//! notifications of their own; the skip set marks them so they are not
//! animated again.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::animation::settings::validate_duration;
use crate::animation::{
    Curve, Pausable, PausedFlag, Scheduler, SubscriptionId, TimelineId, TimelineStatus, ValueCell,
};
use crate::error::{AnimationError, Result};

use super::element::{ElementId, ElementRef, Orientation};
use super::list::{ChildList, ListChange};
use super::transition::TransitionAnimation;

/// Layout and relocation parameters of a container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflowConfig {
    pub orientation: Orientation,
    /// Gap between consecutive children.
    pub spacing: f64,
    pub relocation_curve: Curve,
    /// Relocation duration. `None` uses the duration of the entrance or exit
    /// animation that triggered it.
    pub relocation_duration_ms: Option<f64>,
}

impl Default for ReflowConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Vertical,
            spacing: 0.0,
            relocation_curve: Curve::EaseInOut,
            relocation_duration_ms: None,
        }
    }
}

impl ReflowConfig {
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_relocation_curve(mut self, curve: Curve) -> Self {
        self.relocation_curve = curve;
        self
    }

    pub fn with_relocation_duration(mut self, duration_ms: f64) -> Self {
        self.relocation_duration_ms = Some(duration_ms);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.spacing.is_finite() && self.spacing >= 0.0) {
            return Err(AnimationError::InvalidSpacing(self.spacing));
        }
        if let Some(duration) = self.relocation_duration_ms {
            validate_duration(duration)?;
        }
        self.relocation_curve.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PassId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    /// Make room for an inserted element.
    Open,
    /// Close the gap of a removed element.
    Close,
}

/// Offsets closer to 0 than this count as settled.
const SETTLED: f64 = 1e-9;

/// One sibling's movement within a pass.
struct Move {
    id: ElementId,
    offset: ValueCell<f64>,
    from: f64,
    to: f64,
}

/// Moves are shared with the timeline so a layout shift can rebase them.
type Moves = Rc<RefCell<Vec<Move>>>;

struct Pass {
    timeline: TimelineId,
    moves: Moves,
}

/// A sibling whose offset the engine manages.
///
/// `pass` is `None` once the sibling has reached its target but still waits
/// for an exiting element before it to leave the list.
struct Owner {
    pass: Option<PassId>,
    offset: ValueCell<f64>,
}

struct ReflowInner {
    children: ChildList,
    scheduler: Scheduler,
    config: ReflowConfig,
    entrance: Option<TransitionAnimation>,
    exit: Option<TransitionAnimation>,
    paused: PausedFlag,
    skip: RefCell<HashSet<ElementId>>,
    owners: RefCell<HashMap<ElementId, Owner>>,
    passes: RefCell<HashMap<PassId, Pass>>,
    exits: RefCell<HashMap<ElementId, TimelineId>>,
    /// Exiting elements whose gap is closing, with their displacement.
    closing: RefCell<HashMap<ElementId, f64>>,
    next_pass: Cell<u64>,
    subscription: Cell<Option<SubscriptionId>>,
    disposed: Cell<bool>,
}

/// Animates structural changes of a [`ChildList`].
///
/// Dropping the engine (or calling [`dispose`](Self::dispose)) stops
/// listening, completes pending removals immediately and resets every
/// offset it was animating to 0.
pub struct ContainerReflow {
    inner: Rc<ReflowInner>,
}

impl ContainerReflow {
    pub fn new(
        children: ChildList,
        scheduler: &Scheduler,
        config: ReflowConfig,
        entrance: Option<TransitionAnimation>,
        exit: Option<TransitionAnimation>,
    ) -> Result<Self> {
        config.validate()?;
        for animation in entrance.iter().chain(exit.iter()) {
            animation.validate()?;
        }

        let inner = Rc::new(ReflowInner {
            children,
            scheduler: scheduler.clone(),
            config,
            entrance,
            exit,
            paused: PausedFlag::default(),
            skip: RefCell::new(HashSet::new()),
            owners: RefCell::new(HashMap::new()),
            passes: RefCell::new(HashMap::new()),
            exits: RefCell::new(HashMap::new()),
            closing: RefCell::new(HashMap::new()),
            next_pass: Cell::new(0),
            subscription: Cell::new(None),
            disposed: Cell::new(false),
        });

        let weak: Weak<ReflowInner> = Rc::downgrade(&inner);
        let id = inner.children.subscribe(Rc::new(move |change: &ListChange| {
            if let Some(inner) = weak.upgrade() {
                inner.on_change(change);
            }
        }));
        inner.subscription.set(Some(id));
        debug!(?config, "container reflow attached");

        Ok(Self { inner })
    }

    pub fn config(&self) -> &ReflowConfig {
        &self.inner.config
    }

    pub fn children(&self) -> &ChildList {
        &self.inner.children
    }

    /// Elements with pending bookkeeping. Empty whenever no exit is in flight.
    pub fn skip_set_len(&self) -> usize {
        self.inner.skip.borrow().len()
    }

    /// Siblings whose offset is managed by the engine: moving, or parked
    /// until an exiting element before them leaves.
    pub fn relocating_count(&self) -> usize {
        self.inner.owners.borrow().len()
    }

    /// Relocation passes still running.
    pub fn active_passes(&self) -> usize {
        self.inner.passes.borrow().len()
    }

    /// Exit animations still running.
    pub fn pending_exits(&self) -> usize {
        self.inner.exits.borrow().len()
    }

    pub fn dispose(&self) {
        self.inner.teardown();
    }
}

impl ReflowInner {
    fn on_change(self: &Rc<Self>, change: &ListChange) {
        if self.disposed.get() {
            return;
        }
        match change {
            ListChange::Inserted { index, elements } => {
                for (offset, element) in elements.iter().enumerate() {
                    self.on_inserted(index + offset, element);
                }
            }
            ListChange::Removed { index, elements } => {
                // Later elements of a batch sit at the same index once the
                // earlier ones are gone.
                for element in elements {
                    self.on_removed(*index, element);
                }
            }
        }
    }

    fn on_inserted(self: &Rc<Self>, index: usize, element: &ElementRef) {
        let id = element.id();
        if self.skip.borrow_mut().remove(&id) {
            trace!(%id, "put-back insertion skipped");
            return;
        }
        if self.paused.get() {
            return;
        }
        let Some(entrance) = self.entrance.as_ref() else {
            return;
        };

        debug!(%id, index, "element entering");
        entrance.play(Rc::clone(element), &self.scheduler, None);
        self.relocate_later(id, entrance, Direction::Open);
    }

    fn on_removed(self: &Rc<Self>, index: usize, element: &ElementRef) {
        let id = element.id();
        if self.skip.borrow_mut().remove(&id) {
            // Either the exit's own final removal, or someone removed the
            // element before its exit finished.
            let exit = self.exits.borrow_mut().remove(&id);
            if let Some(timeline) = exit {
                self.scheduler.cancel(timeline);
                debug!(%id, "element removed before its exit finished");
            }
            self.settle_removal(index, element);
            return;
        }
        if self.paused.get() {
            return;
        }
        let Some(exit) = self.exit.as_ref() else {
            return;
        };

        self.skip.borrow_mut().insert(id);
        if let Err(err) = self.children.insert(index, Rc::clone(element)) {
            self.skip.borrow_mut().remove(&id);
            warn!(%id, %err, "could not hold removed element for its exit");
            return;
        }
        debug_assert!(
            !self.skip.borrow().contains(&id),
            "put-back insertion must consume its skip entry"
        );
        self.skip.borrow_mut().insert(id);

        debug!(%id, index, "element exiting");
        let weak = Rc::downgrade(self);
        let timeline = exit.play(
            Rc::clone(element),
            &self.scheduler,
            Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.finish_exit(id);
                }
            })),
        );
        self.exits.borrow_mut().insert(id, timeline);
        self.relocate_later(id, exit, Direction::Close);
    }

    fn finish_exit(&self, id: ElementId) {
        self.exits.borrow_mut().remove(&id);
        if self.children.remove_element(id).is_none() {
            self.skip.borrow_mut().remove(&id);
            warn!(%id, "exit finished but element was already gone");
        }
    }

    /// `element` has left the list for good; `index` is where it was.
    ///
    /// If its gap was closing, every managed sibling after it shifts in
    /// layout by the gap, so its offset and its pass are rebased by the
    /// same amount and nothing moves on screen.
    fn settle_removal(&self, index: usize, element: &ElementRef) {
        let id = element.id();
        let removed_owner = self.owners.borrow_mut().remove(&id);
        if let Some(owner) = removed_owner {
            owner.offset.set(0.0);
        }
        let Some(displacement) = self.closing.borrow_mut().remove(&id) else {
            return;
        };

        let shift = -displacement;
        let followers: Vec<ElementId> = self
            .children
            .to_vec()
            .iter()
            .skip(index)
            .map(|child| child.id())
            .collect();

        let mut writes: Vec<(ValueCell<f64>, f64)> = Vec::new();
        let mut released: Vec<ValueCell<f64>> = Vec::new();
        {
            let mut owners = self.owners.borrow_mut();
            let passes = self.passes.borrow();
            for sibling in &followers {
                let Some(owner) = owners.get(sibling) else {
                    continue;
                };
                let rebased = owner.offset.get() + shift;
                match owner.pass.and_then(|pass| passes.get(&pass)) {
                    Some(pass) => {
                        for m in pass.moves.borrow_mut().iter_mut() {
                            if m.id == *sibling {
                                m.from += shift;
                                m.to += shift;
                            }
                        }
                        writes.push((owner.offset.clone(), rebased));
                    }
                    None if rebased.abs() < SETTLED => {
                        if let Some(owner) = owners.remove(sibling) {
                            released.push(owner.offset);
                        }
                    }
                    None => writes.push((owner.offset.clone(), rebased)),
                }
            }
        }
        for (offset, value) in writes {
            offset.set(value);
        }
        for offset in released {
            offset.set(0.0);
        }
        trace!(%id, shift, "siblings rebased after removal");
    }

    fn relocate_later(
        self: &Rc<Self>,
        id: ElementId,
        animation: &TransitionAnimation,
        direction: Direction,
    ) {
        let duration = self
            .config
            .relocation_duration_ms
            .unwrap_or_else(|| animation.duration_ms());
        let start_ms = self.scheduler.now_ms() + animation.delay_ms();
        let weak = Rc::downgrade(self);
        self.scheduler.run_later(move || {
            if let Some(inner) = weak.upgrade() {
                inner.relocate(id, start_ms, duration, direction);
            }
        });
    }

    /// Start a pass over the siblings after `id`. It holds still until
    /// `start_ms`, the moment the triggering animation starts playing.
    ///
    /// Every sibling heads for the sum of the gaps still closing before it:
    /// 0 once all exits ahead of it have left the list.
    fn relocate(
        self: &Rc<Self>,
        id: ElementId,
        start_ms: f64,
        duration_ms: f64,
        direction: Direction,
    ) {
        if self.disposed.get() {
            return;
        }
        let children = self.children.to_vec();
        let Some(index) = children.iter().position(|child| child.id() == id) else {
            trace!(%id, "element left before relocation");
            return;
        };
        if direction == Direction::Close && !self.exits.borrow().contains_key(&id) {
            trace!(%id, "exit no longer pending, gap stays open");
            return;
        }

        let orientation = self.config.orientation;
        let displacement = -(orientation.extent(children[index].size()) + self.config.spacing);
        if direction == Direction::Close {
            self.closing.borrow_mut().insert(id, displacement);
        }

        let moves: Vec<Move> = {
            let owners = self.owners.borrow();
            let closing = self.closing.borrow();
            let mut pending = 0.0;
            let mut moves = Vec::new();
            for (position, sibling) in children.iter().enumerate() {
                if position > index {
                    let offset = sibling.translate(orientation);
                    let managed = owners.contains_key(&sibling.id());
                    let current = if managed { offset.get() } else { 0.0 };
                    let from = match direction {
                        Direction::Open => current + displacement,
                        Direction::Close => current,
                    };
                    moves.push(Move {
                        id: sibling.id(),
                        offset,
                        from,
                        to: pending,
                    });
                }
                if let Some(gap) = closing.get(&sibling.id()) {
                    pending += gap;
                }
            }
            moves
        };
        if moves.is_empty() {
            return;
        }

        let pass = PassId(self.next_pass.get());
        self.next_pass.set(pass.0 + 1);
        {
            let mut owners = self.owners.borrow_mut();
            for m in &moves {
                owners.insert(
                    m.id,
                    Owner {
                        pass: Some(pass),
                        offset: m.offset.clone(),
                    },
                );
            }
        }
        for m in &moves {
            m.offset.set(m.from);
        }
        let siblings = moves.len();
        let moves: Moves = Rc::new(RefCell::new(moves));

        let curve = self.config.relocation_curve;
        let weak = Rc::downgrade(self);
        let driven = Rc::clone(&moves);
        let timeline = self.scheduler.schedule(move |now| {
            let Some(inner) = weak.upgrade() else {
                return TimelineStatus::Finished;
            };
            let progress = if now < start_ms {
                0.0
            } else if duration_ms <= 0.0 {
                1.0
            } else {
                ((now - start_ms) / duration_ms).min(1.0)
            };
            if progress >= 1.0 {
                inner.finish_pass(pass, &driven);
                return TimelineStatus::Finished;
            }
            let eased = curve.evaluate(progress);
            let frame: Vec<(ValueCell<f64>, f64)> = driven
                .borrow()
                .iter()
                .filter(|m| inner.owns(pass, m.id))
                .map(|m| (m.offset.clone(), m.from + (m.to - m.from) * eased))
                .collect();
            for (offset, value) in frame {
                offset.set(value);
            }
            TimelineStatus::Running
        });
        self.passes.borrow_mut().insert(pass, Pass { timeline, moves });
        debug!(
            %id,
            ?direction,
            siblings,
            displacement,
            start_ms,
            duration_ms,
            "relocation started"
        );
    }

    fn owns(&self, pass: PassId, id: ElementId) -> bool {
        self.owners
            .borrow()
            .get(&id)
            .is_some_and(|owner| owner.pass == Some(pass))
    }

    /// Land every sibling the pass still owns on its target. Siblings whose
    /// target is 0 are released; the rest stay parked until the exits ahead
    /// of them leave the list.
    fn finish_pass(&self, pass: PassId, moves: &Moves) {
        self.passes.borrow_mut().remove(&pass);
        let mut landed: Vec<(ValueCell<f64>, f64)> = Vec::new();
        let mut parked = 0;
        {
            let mut owners = self.owners.borrow_mut();
            for m in moves.borrow().iter() {
                if !owners.get(&m.id).is_some_and(|owner| owner.pass == Some(pass)) {
                    continue;
                }
                if m.to.abs() < SETTLED {
                    if let Some(owner) = owners.remove(&m.id) {
                        landed.push((owner.offset, 0.0));
                    }
                } else if let Some(owner) = owners.get_mut(&m.id) {
                    owner.pass = None;
                    landed.push((owner.offset.clone(), m.to));
                    parked += 1;
                }
            }
        }
        let released = landed.len() - parked;
        for (offset, value) in landed {
            offset.set(value);
        }
        trace!(released, parked, "relocation finished");
    }

    fn teardown(&self) {
        if self.disposed.replace(true) {
            return;
        }
        if let Some(id) = self.subscription.take() {
            self.children.unsubscribe(id);
        }

        let passes: Vec<TimelineId> = self
            .passes
            .borrow_mut()
            .drain()
            .map(|(_, pass)| pass.timeline)
            .collect();
        for timeline in passes {
            self.scheduler.cancel(timeline);
        }
        let owners: Vec<Owner> = self.owners.borrow_mut().drain().map(|(_, o)| o).collect();
        for owner in owners {
            owner.offset.set(0.0);
        }

        let exits: Vec<(ElementId, TimelineId)> = self.exits.borrow_mut().drain().collect();
        for (id, timeline) in exits {
            self.scheduler.cancel(timeline);
            self.children.remove_element(id);
        }
        self.closing.borrow_mut().clear();
        self.skip.borrow_mut().clear();
        debug!("container reflow detached");
    }
}

impl Drop for ReflowInner {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl Pausable for ContainerReflow {
    /// While paused, insertions and removals take effect immediately.
    fn paused_flag(&self) -> PausedFlag {
        self.inner.paused.clone()
    }
}

impl fmt::Debug for ContainerReflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerReflow")
            .field("config", &self.inner.config)
            .field("entrance", &self.inner.entrance)
            .field("exit", &self.inner.exit)
            .field("paused", &self.inner.paused.get())
            .field("skip", &self.inner.skip.borrow().len())
            .field("relocating", &self.inner.owners.borrow().len())
            .finish()
    }
}
