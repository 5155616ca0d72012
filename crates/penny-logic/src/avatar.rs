//! Pure avatar feedback math: size and speed as functions of money.
//!
//! Nothing here stores state. The engine recomputes the target radius every
//! frame from `checking + savings + growth bonus`, so the avatar can never
//! drift away from the ledger it reflects.

use crate::money::{scale_cents, Cents};

pub const BASE_RADIUS: f32 = 18.0;
pub const MIN_RADIUS: f32 = 14.0;
pub const MAX_RADIUS: f32 = 70.0;
/// Radius gained per sqrt(dollar).
pub const RADIUS_PER_ROOT_DOLLAR: f32 = 2.6;

pub const MAX_SPEED: f32 = 260.0;
pub const MIN_SPEED: f32 = 120.0;
/// Speed lost per unit of radius above the base.
pub const SPEED_PER_RADIUS: f32 = 2.4;

/// Easing rates (per second) for radius, velocity and camera.
pub const RADIUS_EASE_RATE: f32 = 4.0;
pub const VELOCITY_EASE_RATE: f32 = 6.0;
pub const CAMERA_EASE_RATE: f32 = 5.0;

/// Longest frame step integrated at once, in seconds.
pub const MAX_FRAME_DT: f32 = 0.033;

/// Pointer offsets shorter than this (from viewport centre) are ignored.
pub const POINTER_DEAD_ZONE: f32 = 12.0;

pub const COIN_PICKUP_RADIUS: f32 = 12.0;
pub const TASK_PICKUP_RADIUS: f32 = 26.0;

/// Face values a coin may roll.
pub const COIN_VALUES: [Cents; 4] = [25, 50, 100, 200];

pub const COIN_GROWTH_FACTOR: f64 = 0.35;
pub const PAYMENT_GROWTH_FACTOR: f64 = 0.25;
pub const EXPIRY_PENALTY_FACTOR: f64 = 0.20;

/// Target avatar radius for a combined fund total (cents, bonus included).
pub fn radius_for_total(total_cents: Cents) -> f32 {
    let dollars = total_cents.max(0) as f32 / 100.0;
    (BASE_RADIUS + dollars.sqrt() * RADIUS_PER_ROOT_DOLLAR).clamp(MIN_RADIUS, MAX_RADIUS)
}

/// Top speed for a given radius. Bigger avatars are slower.
pub fn speed_for_radius(radius: f32) -> f32 {
    (MAX_SPEED - (radius - BASE_RADIUS) * SPEED_PER_RADIUS).clamp(MIN_SPEED, MAX_SPEED)
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Fraction of the remaining gap to close this frame for an exponential
/// ease at `rate` per second.
pub fn ease_factor(rate: f32, dt: f32) -> f32 {
    (dt * rate).clamp(0.0, 1.0)
}

/// Clamp a raw frame delta (seconds) into `[0, MAX_FRAME_DT]`.
pub fn clamp_frame_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, MAX_FRAME_DT)
    } else {
        0.0
    }
}

/// Unit steering direction from four directional keys. Opposite keys cancel.
pub fn steer_from_keys(up: bool, down: bool, left: bool, right: bool) -> (f32, f32) {
    let mut ax = 0.0f32;
    let mut ay = 0.0f32;
    if up {
        ay -= 1.0;
    }
    if down {
        ay += 1.0;
    }
    if left {
        ax -= 1.0;
    }
    if right {
        ax += 1.0;
    }
    let mag = (ax * ax + ay * ay).sqrt();
    if mag > 0.0 {
        (ax / mag, ay / mag)
    } else {
        (0.0, 0.0)
    }
}

/// Steering from a pointer offset relative to the viewport centre.
///
/// The magnitude ramps from 0 at the dead zone towards 1 far away, so small
/// nudges give slow movement.
pub fn steer_from_pointer(dx: f32, dy: f32) -> (f32, f32) {
    let mag = (dx * dx + dy * dy).sqrt();
    if mag <= 0.0 {
        return (0.0, 0.0);
    }
    let strength = (mag - POINTER_DEAD_ZONE).max(0.0) / mag;
    (dx / mag * strength, dy / mag * strength)
}

pub fn coin_growth(earned: Cents) -> Cents {
    scale_cents(earned, COIN_GROWTH_FACTOR)
}

pub fn payment_growth(cost: Cents) -> Cents {
    scale_cents(cost, PAYMENT_GROWTH_FACTOR)
}

/// Negative adjustment applied when a task expires unpaid.
pub fn expiry_penalty(cost: Cents) -> Cents {
    -scale_cents(cost, EXPIRY_PENALTY_FACTOR)
}
