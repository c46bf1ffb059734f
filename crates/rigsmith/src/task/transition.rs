//! Timed, eased movement of one target between two positions.

use crate::animation::EaseFunction;
use crate::math::Vec3;

/// Grace period after a transition's nominal duration before it counts as
/// finished. Dependents that start "from where this one ended" never see a
/// half-moved part.
pub const DEFAULT_SETTLE_DELAY: f32 = 0.5;

/// The body of a transition task.
///
/// Advancing a transition runs its start action on the first tick, moves the
/// target along the eased path, and runs its end action on the tick that
/// crosses `duration + settle`.
#[derive(Debug, Clone)]
pub struct Transition<A> {
    from: Vec3,
    to: Vec3,
    duration: f32,
    settle: f32,
    ease: EaseFunction,
    elapsed: f32,
    on_start: Option<A>,
    on_end: Option<A>,
}

impl<A> Transition<A> {
    pub fn new(from: Vec3, to: Vec3, duration: f32) -> Self {
        Self {
            from,
            to,
            duration: duration.max(0.0),
            settle: DEFAULT_SETTLE_DELAY,
            ease: EaseFunction::default(),
            elapsed: 0.0,
            on_start: None,
            on_end: None,
        }
    }

    pub fn with_settle(mut self, settle: f32) -> Self {
        self.settle = settle.max(0.0);
        self
    }

    pub fn with_ease(mut self, ease: EaseFunction) -> Self {
        self.ease = ease;
        self
    }

    /// Action performed on the first tick, before the target moves.
    pub fn on_start(mut self, action: A) -> Self {
        self.on_start = Some(action);
        self
    }

    /// Action performed once the transition finishes.
    pub fn on_end(mut self, action: A) -> Self {
        self.on_end = Some(action);
        self
    }

    pub fn from(&self) -> Vec3 {
        self.from
    }

    pub fn to(&self) -> Vec3 {
        self.to
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed > self.duration + self.settle
    }

    /// Current position along the eased path.
    pub fn position(&self) -> Vec3 {
        let t = if self.duration <= f32::EPSILON {
            1.0
        } else {
            self.elapsed / self.duration
        };
        self.from.lerp(self.to, self.ease.sample(t))
    }

    /// Total time a force-finish feeds in so the end state is always reached.
    pub(crate) fn overshoot(&self) -> f32 {
        self.duration + self.settle + 1.0
    }

    pub(crate) fn rewind(&mut self) {
        self.elapsed = 0.0;
    }

    /// Advance by `dt`. Returns the actions to perform in order around the
    /// placement: `(start, position, end)`.
    pub(crate) fn step(&mut self, dt: f32) -> Step<A> {
        let start = self.on_start.take();
        let was_finished = self.is_finished();
        self.elapsed += dt;
        let end = if !was_finished && self.is_finished() {
            self.on_end.take()
        } else {
            None
        };
        Step {
            start,
            position: self.position(),
            end,
        }
    }
}

pub(crate) struct Step<A> {
    pub start: Option<A>,
    pub position: Vec3,
    pub end: Option<A>,
}
