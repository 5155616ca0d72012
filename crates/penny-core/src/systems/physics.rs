//! Physics system - eases the avatar's size and velocity, then integrates position.

use penny_logic::avatar::{
    ease_factor, lerp, radius_for_total, speed_for_radius, RADIUS_EASE_RATE, VELOCITY_EASE_RATE,
};
use penny_logic::money::Cents;
use penny_logic::world::WorldConfig;

use crate::components::{Avatar, Vec2};

/// Advance the avatar by `dt` seconds.
///
/// `funds_cents` is checking + savings. The growth bonus is added here so
/// the radius always tracks the ledger rather than a stored copy of it.
pub fn integrate_avatar(
    avatar: &mut Avatar,
    funds_cents: Cents,
    steering: Vec2,
    world: &WorldConfig,
    dt: f32,
) {
    let target_radius = radius_for_total(funds_cents.saturating_add(avatar.growth_cents));
    avatar.radius = lerp(avatar.radius, target_radius, ease_factor(RADIUS_EASE_RATE, dt));

    let desired = steering * speed_for_radius(avatar.radius);
    avatar.velocity = avatar
        .velocity
        .lerp(desired, ease_factor(VELOCITY_EASE_RATE, dt));

    let moved = avatar.position + avatar.velocity * dt;
    let r = avatar.radius;
    avatar.position = moved.clamp(
        Vec2::new(r, r),
        Vec2::new((world.width - r).max(r), (world.height - r).max(r)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> WorldConfig {
        WorldConfig::default()
    }

    #[test]
    fn test_velocity_eases_not_instant() {
        let mut avatar = Avatar::spawn(&world(), 7000);
        integrate_avatar(&mut avatar, 7000, Vec2::new(1.0, 0.0), &world(), 0.016);
        let top = speed_for_radius(avatar.radius);
        assert!(avatar.velocity.x > 0.0);
        assert!(avatar.velocity.x < top * 0.5);
    }

    #[test]
    fn test_reaches_top_speed_eventually() {
        let mut avatar = Avatar::spawn(&world(), 7000);
        for _ in 0..200 {
            integrate_avatar(&mut avatar, 7000, Vec2::new(0.0, 1.0), &world(), 0.033);
        }
        let top = speed_for_radius(avatar.radius);
        assert!((avatar.velocity.y - top).abs() < 1.0 || avatar.position.y >= world().height - avatar.radius - 0.01);
    }

    #[test]
    fn test_position_clamped_to_world() {
        let mut avatar = Avatar::spawn(&world(), 0);
        avatar.position = Vec2::new(5.0, 5.0);
        avatar.velocity = Vec2::new(-500.0, -500.0);
        integrate_avatar(&mut avatar, 0, Vec2::new(-1.0, -1.0), &world(), 0.033);
        assert!(avatar.position.x >= avatar.radius);
        assert!(avatar.position.y >= avatar.radius);
    }

    #[test]
    fn test_radius_tracks_funds_and_growth() {
        let mut avatar = Avatar::spawn(&world(), 0);
        avatar.growth_cents = 10_000;
        for _ in 0..300 {
            integrate_avatar(&mut avatar, 0, Vec2::ZERO, &world(), 0.033);
        }
        assert!((avatar.radius - radius_for_total(10_000)).abs() < 0.01);
    }

    #[test]
    fn test_idle_avatar_stays_put() {
        let mut avatar = Avatar::spawn(&world(), 5000);
        let start = avatar.position;
        integrate_avatar(&mut avatar, 5000, Vec2::ZERO, &world(), 0.033);
        assert_eq!(avatar.position, start);
    }
}
