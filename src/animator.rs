//! Pointer-driven tilt animation.
//!
//! The pointer position is normalized to `[-1, 1]` on both axes and mapped to a
//! bounded yaw/pitch target. Each axis is driven by a [`Tween`], a tiny state
//! machine that eases from wherever it currently is toward the latest target.
//! A new target never queues behind the running transition: it restarts the clock
//! from the current interpolated value, so the sampled orientation stays continuous.

use cgmath::{Quaternion, Rad, Rotation3};
use winit::dpi::{PhysicalPosition, PhysicalSize};

use crate::config::TiltConfig;

/// Easing curves for [`Tween`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// Quadratic deceleration: `1 - (1 - t)^2`.
    QuadOut,
    /// Cubic deceleration: `1 - (1 - t)^3`. Drives the pointer tilt.
    #[default]
    CubicOut,
}

impl Easing {
    /// Maps linear progress `t` (clamped to `[0, 1]`) onto the curve.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadOut => 1.0 - (1.0 - t).powi(2),
            Easing::CubicOut => 1.0 - (1.0 - t).powi(3),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum TweenState {
    Idle {
        value: f32,
    },
    Transitioning {
        from: f32,
        to: f32,
        current: f32,
        elapsed: f32,
    },
}

/// A single eased scalar.
#[derive(Clone, Debug, PartialEq)]
pub struct Tween {
    state: TweenState,
    duration: f32,
    easing: Easing,
}

impl Tween {
    pub fn new(value: f32, duration: f32, easing: Easing) -> Self {
        Self {
            state: TweenState::Idle { value },
            duration,
            easing,
        }
    }

    pub fn value(&self) -> f32 {
        match self.state {
            TweenState::Idle { value } => value,
            TweenState::Transitioning { current, .. } => current,
        }
    }

    /// The value this tween is heading for (its value when idle).
    pub fn target(&self) -> f32 {
        match self.state {
            TweenState::Idle { value } => value,
            TweenState::Transitioning { to, .. } => to,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, TweenState::Idle { .. })
    }

    /// Redirects toward `to`, starting from the current interpolated value.
    pub fn retarget(&mut self, to: f32) {
        let from = self.value();
        if self.duration <= 0.0 {
            self.state = TweenState::Idle { value: to };
            return;
        }
        self.state = TweenState::Transitioning {
            from,
            to,
            current: from,
            elapsed: 0.0,
        };
    }

    /// Advances by `dt` seconds and returns the new value.
    pub fn update(&mut self, dt: f32) -> f32 {
        if let TweenState::Transitioning {
            from,
            to,
            current,
            elapsed,
        } = &mut self.state
        {
            *elapsed += dt.max(0.0);
            if *elapsed >= self.duration {
                let to = *to;
                self.state = TweenState::Idle { value: to };
            } else {
                let eased = self.easing.apply(*elapsed / self.duration);
                *current = *from + (*to - *from) * eased;
            }
        }
        self.value()
    }
}

/// Pointer position rescaled to `[-1, 1]` relative to the viewport.
///
/// `(-1, -1)` is the top-left corner, `(1, 1)` the bottom-right one.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerTarget {
    pub x: f32,
    pub y: f32,
}

impl PointerTarget {
    /// Normalizes a cursor position reported in the same pixel space as `size`.
    ///
    /// Positions outside the viewport (winit reports those while a button is held)
    /// are clamped to its edges.
    pub fn from_cursor(position: PhysicalPosition<f64>, size: PhysicalSize<u32>) -> Self {
        let width = f64::from(size.width.max(1));
        let height = f64::from(size.height.max(1));
        let x = position.x.clamp(0.0, width) / width * 2.0 - 1.0;
        let y = position.y.clamp(0.0, height) / height * 2.0 - 1.0;
        Self {
            x: x as f32,
            y: y as f32,
        }
    }
}

/// Yaw and pitch in radians. Yaw turns around +Y, pitch around +X.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Orientation {
    pub pitch: f32,
    pub yaw: f32,
}

impl Orientation {
    /// Rotation matching an XYZ-ordered Euler rotation of `(pitch, yaw, 0)`.
    pub fn to_quaternion(self) -> Quaternion<f32> {
        Quaternion::from_angle_x(Rad(self.pitch)) * Quaternion::from_angle_y(Rad(self.yaw))
    }
}

/// Eases a model's yaw and pitch toward the pointer.
#[derive(Clone, Debug)]
pub struct TiltAnimator {
    max_angle: Rad<f32>,
    pitch: Tween,
    yaw: Tween,
}

impl TiltAnimator {
    pub fn new(config: &TiltConfig) -> Self {
        Self {
            max_angle: config.max_angle,
            pitch: Tween::new(0.0, config.duration, config.easing),
            yaw: Tween::new(0.0, config.duration, config.easing),
        }
    }

    /// Target orientation for a normalized pointer, bounded by the max angle.
    pub fn target_for(&self, pointer: PointerTarget) -> Orientation {
        Orientation {
            pitch: pointer.y * self.max_angle.0,
            yaw: pointer.x * self.max_angle.0,
        }
    }

    /// Starts or redirects the transition toward the pointer.
    pub fn point_at(&mut self, pointer: PointerTarget) -> Orientation {
        let target = self.target_for(pointer);
        self.pitch.retarget(target.pitch);
        self.yaw.retarget(target.yaw);
        target
    }

    pub fn update(&mut self, dt: f32) -> Orientation {
        Orientation {
            pitch: self.pitch.update(dt),
            yaw: self.yaw.update(dt),
        }
    }

    pub fn orientation(&self) -> Orientation {
        Orientation {
            pitch: self.pitch.value(),
            yaw: self.yaw.value(),
        }
    }

    pub fn target(&self) -> Orientation {
        Orientation {
            pitch: self.pitch.target(),
            yaw: self.yaw.target(),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.pitch.is_idle() && self.yaw.is_idle()
    }
}
