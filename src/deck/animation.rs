/// Card animations stepped by elapsed time
///
/// The deck owns its animations and advances them explicitly from the
/// frame clock, so there is no hidden animation driver.

use cgmath::{InnerSpace, Vector2, Zero};
use std::time::Duration;

/// Distance and speed under which a spring counts as settled
const SPRING_REST_EPSILON: f32 = 0.5;
/// Largest integration step for the spring, in seconds
const SPRING_MAX_STEP: f32 = 1.0 / 240.0;

/// Fixed-duration tween toward a target (used for the off-screen fling)
#[derive(Debug, Clone, PartialEq)]
pub struct Timing {
    from: Vector2<f32>,
    to: Vector2<f32>,
    duration: Duration,
    elapsed: Duration,
}

impl Timing {
    pub fn new(from: Vector2<f32>, to: Vector2<f32>, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration,
            elapsed: Duration::ZERO,
        }
    }

    /// Advance by `dt`; returns the new position and whether the tween finished
    pub fn step(&mut self, dt: Duration) -> (Vector2<f32>, bool) {
        self.elapsed = (self.elapsed + dt).min(self.duration);
        if self.duration.is_zero() || self.elapsed >= self.duration {
            return (self.to, true);
        }
        let t = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
        (self.from + (self.to - self.from) * ease_in_out(t), false)
    }
}

/// Cubic ease-in-out over `t` in [0, 1]
fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Damped spring pulling a position back to the origin
#[derive(Debug, Clone, PartialEq)]
pub struct Spring {
    position: Vector2<f32>,
    velocity: Vector2<f32>,
    stiffness: f32,
    damping: f32,
}

impl Spring {
    pub fn new(from: Vector2<f32>, stiffness: f32, damping: f32) -> Self {
        Self {
            position: from,
            velocity: Vector2::zero(),
            stiffness: stiffness.max(1.0),
            damping: damping.max(0.0),
        }
    }

    /// Advance by `dt`; returns the new position and whether the spring settled
    pub fn step(&mut self, dt: Duration) -> (Vector2<f32>, bool) {
        let mut remaining = dt.as_secs_f32();
        while remaining > 0.0 {
            let h = remaining.min(SPRING_MAX_STEP);
            // Semi-implicit Euler, unit mass
            let accel = self.position * -self.stiffness - self.velocity * self.damping;
            self.velocity += accel * h;
            self.position += self.velocity * h;
            remaining -= h;
        }

        if self.position.magnitude() < SPRING_REST_EPSILON
            && self.velocity.magnitude() < SPRING_REST_EPSILON
        {
            self.position = Vector2::zero();
            self.velocity = Vector2::zero();
            return (self.position, true);
        }
        (self.position, false)
    }
}
