//! # Animation — Easing Curves and Procedural Spin
//!
//! Two small pieces of motion live here:
//!
//! ## Easing
//!
//! [`EaseFunction`] maps a normalized time `t` in \[0, 1\] to an eased weight.
//! Transition tasks use it to interpolate a node between two positions, so
//! parts accelerate as they drop into a slot or lift out of it.
//!
//! ## Procedural Spin
//!
//! Asset nodes tagged `anim"rotate"` get a [`SpinAnimation`]: fan rotors and
//! wheels spinning about an axis at a fixed angular speed. The animation is
//! driven by absolute time and derives its own delta from the last time it
//! saw, so pausing playback simply stops feeding it time.

use serde::{Deserialize, Serialize};

use crate::math::{Quat, Vec3};
use crate::scene::{NodeId, SceneGraph};

/// Standard easing curves.
///
/// Each variant maps `t` in \[0, 1\] to an eased value in roughly \[0, 1\].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EaseFunction {
    Linear,
    #[default]
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    SineIn,
    SineOut,
    SineInOut,
}

impl EaseFunction {
    /// Evaluate the easing function at `t` (clamped to \[0, 1\]).
    pub fn sample(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::QuadIn => t * t,
            Self::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::CubicIn => t * t * t,
            Self::CubicOut => 1.0 - (1.0 - t).powi(3),
            Self::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Self::SineIn => 1.0 - (t * std::f32::consts::FRAC_PI_2).cos(),
            Self::SineOut => (t * std::f32::consts::FRAC_PI_2).sin(),
            Self::SineInOut => -(std::f32::consts::PI * t).cos() / 2.0 + 0.5,
        }
    }
}

/// Spins a node about an axis at a fixed angular speed.
#[derive(Debug, Clone)]
pub struct SpinAnimation {
    target: NodeId,
    name: String,
    /// Radians per second.
    pub speed: f32,
    axis: Vec3,
    initial: Quat,
    accumulated: Quat,
    last_time: f32,
}

impl SpinAnimation {
    /// Bind a spin to `target`, capturing its current rotation as the base.
    pub fn new(target: NodeId, name: impl Into<String>, speed: f32, initial: Quat) -> Self {
        Self {
            target,
            name: name.into(),
            speed,
            axis: Vec3::Y,
            initial,
            accumulated: Quat::IDENTITY,
            last_time: 0.0,
        }
    }

    /// Spin about a different axis (builder pattern). Defaults to up.
    pub fn with_axis(mut self, axis: Vec3) -> Self {
        self.axis = axis.normalize_or(Vec3::Y);
        self
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn axis(&self) -> Vec3 {
        self.axis
    }

    /// Advance to absolute `time` (seconds) and write the rotation.
    pub fn animate(&mut self, time: f32, scene: &mut dyn SceneGraph) {
        let delta = time - self.last_time;
        self.last_time = time;
        let step = Quat::from_axis_angle(self.axis, self.speed * delta);
        self.accumulated = (self.accumulated * step).normalize();
        scene.set_rotation(self.target, self.initial * self.accumulated);
    }

    /// Same spin bound to another node, starting from that node's rotation.
    pub fn rebind(&self, target: NodeId, initial: Quat) -> Self {
        Self::new(target, self.name.clone(), self.speed, initial).with_axis(self.axis)
    }
}
