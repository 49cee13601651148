//! Entrance and exit animations for container children.
//!
//! An [`Effect`] knows how to render one cycle of a visual transition on an
//! element; a [`TransitionAnimation`] plays an effect with a speed multiplier,
//! a start delay and a number of cycles. Presets beyond [`NoEffect`] and
//! [`Fade`] belong to the host.

use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::animation::settings::validate_duration;
use crate::animation::{Curve, Scheduler, TimelineId, TimelineStatus};
use crate::error::{AnimationError, Result};

use super::element::{Element, ElementRef};

/// One cycle of a visual transition.
pub trait Effect {
    /// Length of one cycle at speed 1.
    fn cycle_duration_ms(&self) -> f64;

    /// Render the effect at `progress` in `[0, 1]`.
    fn apply(&self, element: &dyn Element, progress: f64);

    /// Leave the element in its final state.
    fn finish(&self, element: &dyn Element) {
        self.apply(element, 1.0);
    }
}

/// An effect that changes nothing and takes no time.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEffect;

impl Effect for NoEffect {
    fn cycle_duration_ms(&self) -> f64 {
        0.0
    }

    fn apply(&self, _element: &dyn Element, _progress: f64) {}
}

/// Opacity fade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fade {
    pub from: f64,
    pub to: f64,
    pub duration_ms: f64,
    pub curve: Curve,
}

impl Fade {
    pub fn new(from: f64, to: f64, duration_ms: f64) -> Self {
        Self {
            from,
            to,
            duration_ms,
            curve: Curve::Linear,
        }
    }

    /// Transparent to opaque.
    pub fn fade_in(duration_ms: f64) -> Self {
        Self::new(0.0, 1.0, duration_ms)
    }

    /// Opaque to transparent.
    pub fn fade_out(duration_ms: f64) -> Self {
        Self::new(1.0, 0.0, duration_ms)
    }

    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }
}

impl Effect for Fade {
    fn cycle_duration_ms(&self) -> f64 {
        self.duration_ms
    }

    fn apply(&self, element: &dyn Element, progress: f64) {
        let eased = self.curve.evaluate(progress);
        element
            .opacity()
            .set(self.from + (self.to - self.from) * eased);
    }
}

/// An effect played at some speed after some delay, one or more times.
#[derive(Clone)]
pub struct TransitionAnimation {
    effect: Rc<dyn Effect>,
    speed: f64,
    delay_ms: f64,
    cycle_count: u32,
}

impl TransitionAnimation {
    pub fn new(effect: impl Effect + 'static) -> Self {
        Self {
            effect: Rc::new(effect),
            speed: 1.0,
            delay_ms: 0.0,
            cycle_count: 1,
        }
    }

    /// An animation that completes on the next pulse without visible change.
    pub fn none() -> Self {
        Self::new(NoEffect)
    }

    /// Speed multiplier; 2.0 plays twice as fast.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_delay(mut self, delay_ms: f64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Play the effect `cycles` times back to back, restarting from 0 each time.
    pub fn with_cycle_count(mut self, cycles: u32) -> Self {
        self.cycle_count = cycles;
        self
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn delay_ms(&self) -> f64 {
        self.delay_ms
    }

    pub fn cycle_count(&self) -> u32 {
        self.cycle_count
    }

    pub fn effect(&self) -> &dyn Effect {
        &*self.effect
    }

    /// Playing time of one cycle at the configured speed.
    pub fn cycle_ms(&self) -> f64 {
        self.effect.cycle_duration_ms() / self.speed
    }

    /// Playing time of all cycles, excluding the delay.
    pub fn duration_ms(&self) -> f64 {
        self.cycle_ms() * f64::from(self.cycle_count)
    }

    /// Delay plus playing time.
    pub fn total_ms(&self) -> f64 {
        self.delay_ms + self.duration_ms()
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(AnimationError::InvalidSpeed(self.speed));
        }
        if self.cycle_count == 0 {
            return Err(AnimationError::InvalidCycleCount(0));
        }
        validate_duration(self.delay_ms)?;
        validate_duration(self.effect.cycle_duration_ms())
    }

    /// Play on `element`, starting now. `on_finished` runs once, right after
    /// the final frame.
    ///
    /// The first frame is applied immediately so the element never shows
    /// its pre-transition state.
    pub fn play(
        &self,
        element: ElementRef,
        scheduler: &Scheduler,
        on_finished: Option<Box<dyn FnOnce()>>,
    ) -> TimelineId {
        let effect = Rc::clone(&self.effect);
        let cycle = self.cycle_ms();
        let duration = self.duration_ms();
        let delay = self.delay_ms;
        let start = scheduler.now_ms();
        let mut on_finished = on_finished;

        effect.apply(&*element, 0.0);
        let id = scheduler.schedule(move |now| {
            let elapsed = now - start - delay;
            if elapsed < 0.0 {
                return TimelineStatus::Running;
            }
            if duration > 0.0 && elapsed < duration {
                effect.apply(&*element, (elapsed % cycle) / cycle);
                return TimelineStatus::Running;
            }
            effect.finish(&*element);
            if let Some(done) = on_finished.take() {
                done();
            }
            TimelineStatus::Finished
        });
        trace!(
            %id,
            duration_ms = duration,
            delay_ms = delay,
            cycles = self.cycle_count,
            "transition playing"
        );
        id
    }
}

impl Default for TransitionAnimation {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for TransitionAnimation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitionAnimation")
            .field("cycle_duration_ms", &self.effect.cycle_duration_ms())
            .field("speed", &self.speed)
            .field("delay_ms", &self.delay_ms)
            .field("cycle_count", &self.cycle_count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::Size;
    use crate::container::SceneNode;
    use std::cell::Cell;

    fn element() -> (Rc<SceneNode>, ElementRef) {
        let node = Rc::new(SceneNode::new("item", Size::new(10.0, 10.0)));
        let element: ElementRef = node.clone();
        (node, element)
    }

    #[test]
    fn test_duration_scales_with_speed() {
        let animation = TransitionAnimation::new(Fade::fade_in(300.0)).with_speed(2.0);
        assert_eq!(animation.duration_ms(), 150.0);
        assert_eq!(TransitionAnimation::none().duration_ms(), 0.0);
    }

    #[test]
    fn test_validate() {
        assert!(TransitionAnimation::new(Fade::fade_in(300.0)).validate().is_ok());
        assert_eq!(
            TransitionAnimation::none().with_speed(0.0).validate(),
            Err(AnimationError::InvalidSpeed(0.0))
        );
        assert!(TransitionAnimation::none().with_delay(-1.0).validate().is_err());
        assert!(TransitionAnimation::new(Fade::fade_in(-5.0)).validate().is_err());
        assert_eq!(
            TransitionAnimation::none().with_cycle_count(0).validate(),
            Err(AnimationError::InvalidCycleCount(0))
        );
    }

    #[test]
    fn test_cycles_restart_the_effect() {
        let scheduler = Scheduler::new();
        let (node, element) = element();
        let animation = TransitionAnimation::new(Fade::fade_in(100.0))
            .with_cycle_count(3)
            .with_delay(20.0);
        assert_eq!(animation.duration_ms(), 300.0);
        assert_eq!(animation.total_ms(), 320.0);

        let id = animation.play(element, &scheduler, None);
        scheduler.advance(70.0);
        assert!((node.opacity().get() - 0.5).abs() < 1e-9);
        scheduler.advance(100.0);
        assert!((node.opacity().get() - 0.5).abs() < 1e-9);
        scheduler.advance(75.0);
        assert!((node.opacity().get() - 0.25).abs() < 1e-9);
        assert!(scheduler.is_active(id));

        scheduler.advance(75.0);
        assert_eq!(node.opacity().get(), 1.0);
        assert!(!scheduler.is_active(id));
    }

    #[test]
    fn test_fade_plays_to_completion() {
        let scheduler = Scheduler::new();
        let (node, element) = element();
        let done = Rc::new(Cell::new(false));
        let flag = Rc::clone(&done);

        TransitionAnimation::new(Fade::fade_in(200.0)).play(
            element,
            &scheduler,
            Some(Box::new(move || flag.set(true))),
        );
        assert_eq!(node.opacity().get(), 0.0);

        scheduler.advance(100.0);
        assert!((node.opacity().get() - 0.5).abs() < 1e-9);
        assert!(!done.get());

        scheduler.advance(100.0);
        assert_eq!(node.opacity().get(), 1.0);
        assert!(done.get());
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_delay_holds_first_frame() {
        let scheduler = Scheduler::new();
        let (node, element) = element();
        TransitionAnimation::new(Fade::fade_out(100.0))
            .with_delay(50.0)
            .play(element, &scheduler, None);

        scheduler.advance(40.0);
        assert_eq!(node.opacity().get(), 1.0);
        scheduler.advance(60.0);
        assert!((node.opacity().get() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_no_effect_finishes_next_pulse() {
        let scheduler = Scheduler::new();
        let (_node, element) = element();
        let id = TransitionAnimation::none().play(element, &scheduler, None);
        assert!(scheduler.is_active(id));
        scheduler.advance(16.0);
        assert!(!scheduler.is_active(id));
    }
}
