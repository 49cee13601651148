//! Frame pulse and deferred-work queue.
//!
//! The [`Scheduler`] stands in for a host event loop. It owns a clock, a set
//! of timelines that are ticked once per pulse, and a queue of tasks deferred
//! to the next processing turn. Everything is single-threaded; handles are
//! cheap clones of the same scheduler.
//!
//! # Usage
//!
//! ```
//! use drift_scene::animation::{Scheduler, TimelineStatus};
//!
//! let scheduler = Scheduler::new();
//! let start = scheduler.now_ms();
//! let id = scheduler.schedule(move |now| {
//!     if now - start >= 100.0 {
//!         TimelineStatus::Finished
//!     } else {
//!         TimelineStatus::Running
//!     }
//! });
//!
//! scheduler.advance(50.0);
//! assert!(scheduler.is_active(id));
//! scheduler.advance(50.0);
//! assert!(!scheduler.is_active(id));
//! ```

use std::cell::RefCell;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;

use tracing::{trace, warn};

use super::types::TimelineId;

/// What a timeline driver reports after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineStatus {
    Running,
    Finished,
}

type Driver = Box<dyn FnMut(f64) -> TimelineStatus>;
type Task = Box<dyn FnOnce()>;

struct Timeline {
    id: TimelineId,
    driver: Driver,
}

#[derive(Default)]
struct SchedulerState {
    now_ms: f64,
    frame: u64,
    timelines: Vec<Timeline>,
    active: HashSet<TimelineId>,
    deferred: VecDeque<Task>,
    ticking: bool,
}

/// Single-threaded frame driver shared by handle.
#[derive(Clone, Default)]
pub struct Scheduler {
    state: Rc<RefCell<SchedulerState>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in milliseconds since the scheduler was created.
    pub fn now_ms(&self) -> f64 {
        self.state.borrow().now_ms
    }

    /// Number of pulses so far.
    pub fn frame(&self) -> u64 {
        self.state.borrow().frame
    }

    /// Register a timeline. The driver is first called on the next pulse,
    /// never from inside `schedule`.
    pub fn schedule(&self, driver: impl FnMut(f64) -> TimelineStatus + 'static) -> TimelineId {
        let id = TimelineId::new();
        let mut state = self.state.borrow_mut();
        state.active.insert(id);
        state.timelines.push(Timeline {
            id,
            driver: Box::new(driver),
        });
        trace!(%id, "timeline scheduled");
        id
    }

    /// Stop a timeline. Its driver is not called again.
    ///
    /// Returns `false` if the timeline had already finished or been cancelled.
    pub fn cancel(&self, id: TimelineId) -> bool {
        let removed = {
            let mut state = self.state.borrow_mut();
            if !state.active.remove(&id) {
                return false;
            }
            // During a pulse the timeline may be checked out; the pulse prunes it.
            state
                .timelines
                .iter()
                .position(|timeline| timeline.id == id)
                .map(|index| state.timelines.remove(index))
        };
        // Drivers capture host handles; drop them outside the borrow.
        drop(removed);
        trace!(%id, "timeline cancelled");
        true
    }

    pub fn is_active(&self, id: TimelineId) -> bool {
        self.state.borrow().active.contains(&id)
    }

    pub fn active_timelines(&self) -> usize {
        self.state.borrow().active.len()
    }

    /// Defer `task` to the next processing turn.
    pub fn run_later(&self, task: impl FnOnce() + 'static) {
        self.state.borrow_mut().deferred.push_back(Box::new(task));
    }

    pub fn pending_tasks(&self) -> usize {
        self.state.borrow().deferred.len()
    }

    /// Run one turn of deferred work without advancing time.
    ///
    /// Tasks deferred while the turn runs wait for the next turn. Returns the
    /// number of tasks run.
    pub fn run_deferred(&self) -> usize {
        let tasks = std::mem::take(&mut self.state.borrow_mut().deferred);
        let count = tasks.len();
        for task in tasks {
            task();
        }
        count
    }

    /// One pulse: advance the clock, run the deferred work queued before the
    /// pulse, then tick every active timeline.
    pub fn advance(&self, delta_ms: f64) {
        {
            let mut state = self.state.borrow_mut();
            if state.ticking {
                warn!("advance called from inside a timeline; ignored");
                return;
            }
            state.now_ms += delta_ms.max(0.0);
            state.frame += 1;
        }
        self.run_deferred();
        self.tick();
    }

    fn tick(&self) {
        let (now, mut timelines) = {
            let mut state = self.state.borrow_mut();
            state.ticking = true;
            (state.now_ms, std::mem::take(&mut state.timelines))
        };

        let mut finished = Vec::new();
        let mut kept = Vec::with_capacity(timelines.len());
        for mut timeline in timelines.drain(..) {
            // Cancelled by an earlier driver in this pulse.
            if !self.is_active(timeline.id) {
                finished.push(timeline);
                continue;
            }
            match (timeline.driver)(now) {
                TimelineStatus::Running if self.is_active(timeline.id) => kept.push(timeline),
                TimelineStatus::Running => finished.push(timeline),
                TimelineStatus::Finished => {
                    self.state.borrow_mut().active.remove(&timeline.id);
                    trace!(id = %timeline.id, "timeline finished");
                    finished.push(timeline);
                }
            }
        }

        {
            let mut state = self.state.borrow_mut();
            // Timelines scheduled during the pulse tick from the next one.
            let scheduled = std::mem::take(&mut state.timelines);
            kept.extend(scheduled);
            let active = &state.active;
            let (live, cancelled): (Vec<_>, Vec<_>) =
                kept.into_iter().partition(|timeline| active.contains(&timeline.id));
            state.timelines = live;
            state.ticking = false;
            finished.extend(cancelled);
        }
        drop(finished);
    }

    /// Pump pulses of `frame_ms` until idle or `max_frames` pulses have run.
    /// Returns the number of pulses used.
    pub fn run_until_idle(&self, frame_ms: f64, max_frames: usize) -> usize {
        let mut frames = 0;
        while !self.is_idle() && frames < max_frames {
            self.advance(frame_ms);
            frames += 1;
        }
        frames
    }

    /// No active timelines and no deferred work.
    pub fn is_idle(&self) -> bool {
        let state = self.state.borrow();
        state.active.is_empty() && state.deferred.is_empty()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Scheduler")
            .field("now_ms", &state.now_ms)
            .field("frame", &state.frame)
            .field("active", &state.active.len())
            .field("deferred", &state.deferred.len())
            .finish()
    }
}

static_assertions::assert_not_impl_any!(Scheduler: Send, Sync);
