//! Runtime tunables.
//!
//! ```json
//! { "transition_duration": 0.25, "ease": "cubic_out" }
//! ```
//!
//! Missing fields fall back to [`Settings::default`].

use serde::{Deserialize, Serialize};

use crate::animation::EaseFunction;
use crate::math::Vec3;
use crate::task::{Transition, DEFAULT_SETTLE_DELAY};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seconds an attach, detach, hide or reveal takes to move.
    pub transition_duration: f32,
    /// Seconds a transition lingers after moving before it counts as finished.
    pub settle_delay: f32,
    /// Vertical nudge, in world units, parts lift by when they come and go.
    pub lift: f32,
    pub ease: EaseFunction,
    /// Radians per second for `anim"rotate"` nodes.
    pub spin_speed: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            transition_duration: 0.5,
            settle_delay: DEFAULT_SETTLE_DELAY,
            lift: 0.03,
            ease: EaseFunction::QuadIn,
            spin_speed: 4.0,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_transition_duration(mut self, seconds: f32) -> Self {
        self.transition_duration = seconds;
        self
    }

    pub fn with_settle_delay(mut self, seconds: f32) -> Self {
        self.settle_delay = seconds;
        self
    }

    pub fn with_lift(mut self, lift: f32) -> Self {
        self.lift = lift;
        self
    }

    pub fn with_ease(mut self, ease: EaseFunction) -> Self {
        self.ease = ease;
        self
    }

    pub fn with_spin_speed(mut self, speed: f32) -> Self {
        self.spin_speed = speed;
        self
    }

    /// A transition configured with these settings.
    pub(crate) fn transition<A>(&self, from: Vec3, to: Vec3) -> Transition<A> {
        Transition::new(from, to, self.transition_duration)
            .with_settle(self.settle_delay)
            .with_ease(self.ease)
    }
}
